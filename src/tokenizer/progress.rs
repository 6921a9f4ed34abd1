// src/tokenizer/progress.rs

#[cfg(feature = "progressbar")]
pub(crate) use indicatif::{ProgressBar, ProgressStyle};

#[cfg(not(feature = "progressbar"))]
pub(crate) use noop::{ProgressBar, ProgressStyle};

// Stand-ins with the subset of the indicatif API the trainer uses.
#[cfg(not(feature = "progressbar"))]
mod noop {
    use std::borrow::Cow;

    pub struct ProgressBar;

    impl ProgressBar {
        pub fn new(_length: u64) -> Self {
            Self
        }

        pub fn set_length(&self, _length: u64) {}
        pub fn set_message(&self, _message: impl Into<Cow<'static, str>>) {}
        pub fn set_style(&self, _style: ProgressStyle) {}
        pub fn inc(&self, _delta: u64) {}
        pub fn reset(&self) {}
        pub fn finish(&self) {}
    }

    pub struct ProgressStyle;

    impl ProgressStyle {
        pub fn default_bar() -> Self {
            Self
        }

        pub fn template(self, _template: &str) -> Result<Self, String> {
            Ok(self)
        }
    }
}
