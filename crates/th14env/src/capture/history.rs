use std::collections::VecDeque;

use serde::Serialize;

use super::GrayFrame;

/// Fixed-depth ring of the most recent frames, oldest first.
///
/// Always holds exactly `depth` frames: it is created full and every push
/// evicts the oldest.
#[derive(Debug, Clone)]
pub struct FrameHistory {
    depth: usize,
    frames: VecDeque<GrayFrame>,
}

impl FrameHistory {
    pub fn new(depth: usize, initial: GrayFrame) -> Self {
        let mut history = Self {
            depth: depth.max(1),
            frames: VecDeque::with_capacity(depth.max(1)),
        };
        history.fill(initial);
        history
    }

    /// Replace the whole history with copies of one frame
    pub fn fill(&mut self, frame: GrayFrame) {
        self.frames.clear();
        for _ in 1..self.depth {
            self.frames.push_back(frame.clone());
        }
        self.frames.push_back(frame);
    }

    pub fn push(&mut self, frame: GrayFrame) {
        if self.frames.len() == self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrayFrame> {
        self.frames.iter()
    }

    pub fn latest(&self) -> Option<&GrayFrame> {
        self.frames.back()
    }

    /// Stack into one `depth × height × width` array
    pub fn stack(&self) -> FrameStack {
        let (width, height) = self
            .frames
            .front()
            .map(|f| (f.width, f.height))
            .unwrap_or_default();
        let data = self
            .frames
            .iter()
            .flat_map(|f| f.pixels.iter().copied())
            .collect();
        FrameStack {
            depth: self.frames.len(),
            height,
            width,
            data,
        }
    }
}

/// Stacked grayscale frames, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameStack {
    pub depth: usize,
    pub height: u32,
    pub width: u32,
    pub data: Vec<u8>,
}

impl FrameStack {
    pub fn shape(&self) -> [usize; 3] {
        [self.depth, self.height as usize, self.width as usize]
    }

    /// Pixels of the `index`-th frame
    pub fn frame(&self, index: usize) -> &[u8] {
        let size = (self.height * self.width) as usize;
        &self.data[index * size..(index + 1) * size]
    }
}
