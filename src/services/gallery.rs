//! Lightbox gallery state
//!
//! Drives the showcase page's media viewer: a main carousel, a
//! thumbnail strip, keyboard navigation and a fullscreen toggle.
//!
//! The main carousel's settled position is the single source of truth
//! for the current slide. Thumbnail clicks and arrow keys only request
//! a scroll; the index itself moves when the carousel reports that it
//! has settled, so rapid clicks cannot leave the strip and the main
//! view pointing at different slides.

/// Instruction for the rendering layer after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Jump the main carousel to a slide without animation
    JumpMain(usize),
    /// Animate the main carousel towards a slide
    ScrollMain(usize),
    /// Scroll the thumbnail strip so a slide is in view
    ScrollThumbs(usize),
}

/// Keyboard input the viewer reacts to while open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
}

/// Viewer state for one gallery of `len` slides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    len: usize,
    index: usize,
    thumb_index: usize,
    open: bool,
    fullscreen: bool,
}

impl Lightbox {
    /// Closed viewer over a gallery of `len` slides
    pub fn new(len: usize) -> Self {
        Self {
            len,
            index: 0,
            thumb_index: 0,
            open: false,
            fullscreen: false,
        }
    }

    /// Number of slides in the gallery
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the gallery has no slides
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Currently settled slide
    pub fn index(&self) -> usize {
        self.index
    }

    /// Slide the thumbnail strip is aligned to
    pub fn thumb_index(&self) -> usize {
        self.thumb_index
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn clamp(&self, slide: usize) -> usize {
        if self.len == 0 {
            0
        } else {
            slide.min(self.len - 1)
        }
    }

    /// Open the viewer at a slide.
    ///
    /// The main carousel jumps straight there; animating from whatever
    /// slide was left behind would flash every slide in between.
    /// Opening an empty gallery does nothing.
    pub fn open_at(&mut self, slide: usize) -> Vec<SyncCommand> {
        if self.len == 0 {
            return Vec::new();
        }
        self.index = self.clamp(slide);
        self.open = true;
        vec![SyncCommand::JumpMain(self.index)]
    }

    /// Close the viewer. Fullscreen never survives a close.
    pub fn close(&mut self) {
        self.open = false;
        self.fullscreen = false;
    }

    /// Thumbnail click: request a main scroll, nothing more.
    /// The index follows once the carousel settles.
    pub fn select_thumb(&mut self, slide: usize) -> Vec<SyncCommand> {
        if !self.open || self.len == 0 {
            return Vec::new();
        }
        vec![SyncCommand::ScrollMain(self.clamp(slide))]
    }

    /// The main carousel settled on a slide; adopt it as the current
    /// index and bring the thumbnail strip along if it drifted.
    pub fn settle(&mut self, slide: usize) -> Vec<SyncCommand> {
        if self.len == 0 {
            return Vec::new();
        }
        self.index = self.clamp(slide);
        if self.thumb_index != self.index {
            self.thumb_index = self.index;
            return vec![SyncCommand::ScrollThumbs(self.index)];
        }
        Vec::new()
    }

    /// Keyboard input. Ignored entirely while the viewer is closed.
    pub fn key(&mut self, key: Key) -> Vec<SyncCommand> {
        if !self.open {
            return Vec::new();
        }

        match key {
            Key::ArrowLeft => self.step(self.index.saturating_sub(1)),
            Key::ArrowRight => self.step(self.clamp(self.index + 1)),
            Key::Escape => {
                self.close();
                Vec::new()
            }
        }
    }

    fn step(&mut self, target: usize) -> Vec<SyncCommand> {
        // At the edges, target equals index and there is nothing to do
        if target == self.index {
            return Vec::new();
        }
        vec![SyncCommand::ScrollMain(target)]
    }

    /// Toggle fullscreen; only meaningful while the viewer is open
    pub fn toggle_fullscreen(&mut self) {
        if self.open {
            self.fullscreen = !self.fullscreen;
        }
    }
}
