//! # Inspection Session
//!
//! All mutable inspector state lives here: configuration, cycle state, the
//! high-level representation registry, the `$last` result, and the lazily
//! built symbol caches.
//!
//! A host keeps one [`Session`] per debugged process and passes its
//! [`Target`] adapter into each call. Operations are synchronous and run one
//! at a time; the only cross-thread handle is the [`InterruptHandle`].
//!
//! ## Lifecycle
//!
//! ```text
//! Session::new(config)
//!   -> attach(target)           locate the deopt stub, drop stale caches
//!   -> evaluate / complete / render / unwind / decorate ...
//!   -> reset_cycles()           from the host's prompt hook
//! ```

use std::ops::{Deref, DerefMut};

use tracing::{debug, info};

use crate::config::{InspectorConfig, Setting, SettingOutcome};
use crate::cycles::CycleGuard;
use crate::error::InspectResult;
use crate::expr::complete::{self, SymbolTrie};
use crate::expr::resolver;
use crate::functions::FunctionIndex;
use crate::interrupt::InterruptHandle;
use crate::target::Target;
use crate::types::{FrameInfo, Value};
use crate::unwind::{DecoratedFrame, DeoptUnwinder, FrameDecorator, PendingFrame, UnwindInfo};
use crate::visual::render::render_value;
use crate::visual::{DecodeContext, HighLevelRepresentation, RepresentationRegistry, VisualNode};

/// Inspector state for one debugged process.
#[derive(Debug)]
pub struct Session
{
    config: InspectorConfig,
    cycles: CycleGuard,
    registry: RepresentationRegistry,
    last: Option<Value>,
    static_symbols: Option<SymbolTrie>,
    functions: Option<FunctionIndex>,
    unwinder: Option<DeoptUnwinder>,
    interrupt: InterruptHandle,
}

impl Default for Session
{
    fn default() -> Self
    {
        Self::new(InspectorConfig::default())
    }
}

impl Session
{
    /// Session with the built-in high-level representations.
    #[must_use]
    pub fn new(config: InspectorConfig) -> Self
    {
        Self {
            config,
            cycles: CycleGuard::new(),
            registry: RepresentationRegistry::with_builtins(),
            last: None,
            static_symbols: None,
            functions: None,
            unwinder: None,
            interrupt: InterruptHandle::new(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &InspectorConfig
    {
        &self.config
    }

    /// Apply a settings command (`svm-print-array-limit 20`, ...).
    ///
    /// Enabling cycle checking starts from a clean cycle state.
    ///
    /// ## Errors
    ///
    /// `UnknownSetting` or `InvalidSetting`.
    pub fn apply_setting(&mut self, name: &str, arg: &str) -> InspectResult<SettingOutcome>
    {
        let outcome = self.config.apply(name, arg)?;
        match outcome {
            SettingOutcome::Changed(Setting::CycleCheck) if self.config.cycle_checking_enabled => {
                self.cycles.reset();
            }
            SettingOutcome::Changed(Setting::CompleteStatics) => self.reset_completions(),
            _ => {}
        }
        if let SettingOutcome::Changed(setting) = outcome {
            info!(%setting, value = %self.config.describe(setting), "setting changed");
        }
        Ok(outcome)
    }

    /// Clone of the interrupt flag, for a signal handler or UI thread.
    pub fn interrupt_handle(&self) -> InterruptHandle
    {
        self.interrupt.clone()
    }

    /// Forget all cycle state. Hosts call this before each prompt.
    pub fn reset_cycles(&mut self)
    {
        self.cycles.reset();
    }

    /// Drop the static-symbol completion tree; it is rebuilt on demand.
    pub fn reset_completions(&mut self)
    {
        self.static_symbols = None;
    }

    /// Drop the function index; it is rebuilt on demand.
    pub fn reset_functions(&mut self)
    {
        self.functions = None;
    }

    /// Add a high-level representation.
    ///
    /// ## Errors
    ///
    /// `DuplicateRepresentation` when the type already has one.
    pub fn register_representation(&mut self, representation: Box<dyn HighLevelRepresentation>) -> InspectResult<()>
    {
        self.registry.register(representation)
    }

    /// Result of the most recent successful [`Session::evaluate`].
    pub fn last(&self) -> Option<&Value>
    {
        self.last.as_ref()
    }

    /// Bind `target` to this session: locate the deoptimization stub and
    /// drop caches built for a previous target.
    pub fn attach(&mut self, target: &dyn Target)
    {
        self.unwinder = DeoptUnwinder::locate(target);
        self.static_symbols = None;
        self.functions = None;
        self.last = None;
        self.cycles.reset();
        info!(deopt_stub = ?self.unwinder.map(|unwinder| unwinder.stub()), "attached to target");
    }

    /// Decode context over this session's state, for hosts that walk
    /// children themselves.
    pub fn context<'a>(&'a mut self, target: &'a dyn Target) -> DecodeContext<'a>
    {
        DecodeContext {
            target,
            config: &self.config,
            guard: &mut self.cycles,
            registry: &self.registry,
            interrupt: &self.interrupt,
        }
    }

    /// Decode `value` without rendering it.
    ///
    /// ## Errors
    ///
    /// Only `Interrupted`.
    pub fn decode(&mut self, target: &dyn Target, value: &Value) -> InspectResult<Option<VisualNode>>
    {
        self.begin_operation();
        self.context(target).decode(value)
    }

    /// Render `value` with the user's limits, starting from a clean cycle
    /// state.
    ///
    /// ## Errors
    ///
    /// Only `Interrupted`.
    pub fn render(&mut self, target: &dyn Target, value: &Value) -> InspectResult<String>
    {
        self.begin_operation();
        self.cycles.reset();
        render_value(&mut self.context(target), value)
    }

    /// Resolve `path` inside a lookup scope, without rendering it or
    /// recording it as `$last`.
    ///
    /// ## Errors
    ///
    /// `Unresolved` or `Interrupted`.
    pub fn resolve(&mut self, target: &dyn Target, path: &str) -> InspectResult<Value>
    {
        self.begin_operation();
        let mut scope = LookupScope::enter(self);
        let (mut ctx, last, _) = scope.parts(target);
        resolver::resolve(&mut ctx, last, path)
    }

    /// Resolve and render `path`.
    ///
    /// On success the value becomes `$last`. The static-symbol tree is
    /// dropped either way, since evaluation may have changed target state.
    ///
    /// ## Errors
    ///
    /// `Unresolved` or `Interrupted`.
    pub fn evaluate(&mut self, target: &dyn Target, path: &str) -> InspectResult<String>
    {
        debug!(path, "evaluating");
        let resolved = self.resolve(target, path);
        self.static_symbols = None;
        let value = resolved?;

        self.last = Some(value.clone());
        self.cycles.reset();
        render_value(&mut self.context(target), &value)
    }

    /// Completion candidates for a partial path.
    ///
    /// ## Errors
    ///
    /// Only `Interrupted`.
    pub fn complete(&mut self, target: &dyn Target, text: &str) -> InspectResult<Vec<String>>
    {
        self.begin_operation();
        if self.config.complete_static_variables && self.static_symbols.is_none() {
            self.static_symbols = Some(SymbolTrie::from_names(target.static_variable_names()));
        }
        let mut scope = LookupScope::enter(self);
        let (mut ctx, last, statics) = scope.parts(target);
        complete::complete(&mut ctx, last, text, statics)
    }

    /// Caller registers of a deoptimized frame; `None` for any other frame
    /// or when the target has no deoptimization stub.
    pub fn unwind(&self, target: &dyn Target, frame: &dyn PendingFrame) -> Option<UnwindInfo>
    {
        self.unwinder?.unwind(target, frame)
    }

    /// Frame decorator for the attached target.
    pub fn decorator(&self) -> FrameDecorator
    {
        FrameDecorator::new(self.unwinder.map(|unwinder| unwinder.stub()))
    }

    /// Decorate one backtrace frame.
    pub fn decorate(&self, frame: &FrameInfo) -> DecoratedFrame
    {
        self.decorator().decorate(frame)
    }

    /// Compiled methods whose name contains `text`.
    pub fn search_functions(&mut self, target: &dyn Target, text: &str) -> Vec<String>
    {
        self.function_index(target)
            .search(text)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Runtime-installed code units of the target.
    pub fn installed_code(&mut self, target: &dyn Target) -> Vec<String>
    {
        self.function_index(target).installed_code().to_vec()
    }

    fn function_index(&mut self, target: &dyn Target) -> &FunctionIndex
    {
        self.functions
            .get_or_insert_with(|| FunctionIndex::from_listing(target.function_listing()))
    }

    fn begin_operation(&mut self)
    {
        self.interrupt.clear();
    }

    fn parts<'a>(
        &'a mut self,
        target: &'a dyn Target,
    ) -> (DecodeContext<'a>, Option<&'a Value>, Option<&'a SymbolTrie>)
    {
        let statics = if self.config.complete_static_variables {
            self.static_symbols.as_ref()
        } else {
            None
        };
        let ctx = DecodeContext {
            target,
            config: &self.config,
            guard: &mut self.cycles,
            registry: &self.registry,
            interrupt: &self.interrupt,
        };
        (ctx, self.last.as_ref(), statics)
    }
}

/// Scope in which expression lookups run.
///
/// Lifts the array and cycle-depth limits, switches cycle checking off and
/// starts from a clean cycle state. A lookup takes one child per hop, so a
/// path may revisit an object on a cycle. The previous settings come back
/// when the scope is dropped, on every exit path.
pub struct LookupScope<'s>
{
    session: &'s mut Session,
    array_element_limit: usize,
    cycle_depth_limit: usize,
    cycle_checking_enabled: bool,
}

impl<'s> LookupScope<'s>
{
    /// Enter a lookup scope on `session`.
    pub fn enter(session: &'s mut Session) -> Self
    {
        let array_element_limit = session.config.array_element_limit;
        let cycle_depth_limit = session.config.cycle_depth_limit;
        let cycle_checking_enabled = session.config.cycle_checking_enabled;
        session.config.array_element_limit = usize::MAX;
        session.config.cycle_depth_limit = usize::MAX;
        session.config.cycle_checking_enabled = false;
        session.cycles.reset();
        Self {
            session,
            array_element_limit,
            cycle_depth_limit,
            cycle_checking_enabled,
        }
    }
}

impl Deref for LookupScope<'_>
{
    type Target = Session;

    fn deref(&self) -> &Session
    {
        self.session
    }
}

impl DerefMut for LookupScope<'_>
{
    fn deref_mut(&mut self) -> &mut Session
    {
        self.session
    }
}

impl Drop for LookupScope<'_>
{
    fn drop(&mut self)
    {
        self.session.config.array_element_limit = self.array_element_limit;
        self.session.config.cycle_depth_limit = self.cycle_depth_limit;
        self.session.config.cycle_checking_enabled = self.cycle_checking_enabled;
    }
}
