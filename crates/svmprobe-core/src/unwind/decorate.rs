//! Backtrace decoration.

use crate::types::{Address, FrameClass, FrameInfo, FrameKind};

/// Function text shown for a deoptimized frame.
pub const DEOPT_FRAME_LABEL: &str = "[DEOPT FRAMES ...]";
/// Prefix marking an inlined frame.
pub const INLINE_PREFIX: &str = "<-- ";

/// A frame as it should appear in a backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedFrame
{
    /// Frame classification
    pub class: FrameClass,
    /// Function column text
    pub function: String,
    /// Whether arguments and locals should be listed
    pub show_variables: bool,
}

/// Rewrites frame descriptions for display.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecorator
{
    deopt_stub: Option<Address>,
}

impl FrameDecorator
{
    /// Decorator aware of the deoptimization stub, if the target has one.
    pub const fn new(deopt_stub: Option<Address>) -> Self
    {
        Self { deopt_stub }
    }

    /// Decorate one frame.
    ///
    /// ```rust
    /// use svmprobe_core::types::{FrameInfo, FrameKind, SourceLocation};
    /// use svmprobe_core::unwind::FrameDecorator;
    ///
    /// let frame = FrameInfo {
    ///     function: Some("java.util.ArrayList.add(java.lang.Object)".into()),
    ///     kind: FrameKind::Inlined,
    ///     location: Some(SourceLocation::new("java/util/ArrayList.java", 455)),
    ///     ..FrameInfo::default()
    /// };
    /// let decorated = FrameDecorator::new(None).decorate(&frame);
    /// assert_eq!(decorated.function, "<-- java.util.ArrayList.add(ArrayList.java:455)");
    /// ```
    pub fn decorate(&self, frame: &FrameInfo) -> DecoratedFrame
    {
        if self.deopt_stub.is_some_and(|stub| stub == frame.pc) {
            return DecoratedFrame {
                class: FrameClass::Deoptimized,
                function: DEOPT_FRAME_LABEL.to_string(),
                show_variables: false,
            };
        }

        let function = match frame.function.as_deref().filter(|name| !name.is_empty()) {
            None => format!("Unknown Frame at {}", frame.sp),
            Some(name) => {
                let name = name.split('(').next().unwrap_or(name);
                let mut text = match frame.kind {
                    FrameKind::Inlined => format!("{INLINE_PREFIX}{name}"),
                    FrameKind::Physical => name.to_string(),
                };
                if let Some(location) = &frame.location {
                    text.push_str(&format!("({location})"));
                }
                text
            }
        };
        DecoratedFrame {
            class: FrameClass::Normal,
            function,
            show_variables: true,
        }
    }

    /// Decorate a whole backtrace, innermost frame first.
    pub fn filter<'a, I>(&'a self, frames: I) -> impl Iterator<Item = DecoratedFrame> + 'a
    where
        I: IntoIterator<Item = &'a FrameInfo>,
        I::IntoIter: 'a,
    {
        frames.into_iter().map(move |frame| self.decorate(frame))
    }
}
