use pin_project::pin_project;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Value of a context attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Duration(Duration),
}

impl AttrValue {
    /// JSON form used by the JSON output format. Durations become
    /// nanoseconds, saturating at `u64::MAX`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Str(s) => serde_json::Value::String(s.clone()),
            AttrValue::I64(v) => serde_json::Value::from(*v),
            AttrValue::U64(v) => serde_json::Value::from(*v),
            AttrValue::F64(v) => serde_json::Value::from(*v),
            AttrValue::Bool(v) => serde_json::Value::from(*v),
            AttrValue::Duration(d) => serde_json::Value::from(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::I64(v) => write!(f, "{}", v),
            AttrValue::U64(v) => write!(f, "{}", v),
            AttrValue::F64(v) => write!(f, "{}", v),
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Duration(d) => write!(f, "{:?}", d),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::I64(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::I64(value.into())
    }
}

impl From<u64> for AttrValue {
    fn from(value: u64) -> Self {
        AttrValue::U64(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::U64(value.into())
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        AttrValue::U64(value as u64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::F64(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Duration> for AttrValue {
    fn from(value: Duration) -> Self {
        AttrValue::Duration(value)
    }
}

/// A single key/value attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K, V> From<(K, V)> for Attr
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from((key, value): (K, V)) -> Self {
        Attr::new(key, value)
    }
}

/// Immutable set of attributes attached to log records emitted while it is
/// current.
///
/// Deriving a context with [`with_attributes`](Self::with_attributes) never
/// touches the original, so contexts can be cloned freely into threads and
/// tasks that fork from a common parent.
#[derive(Clone, Default, PartialEq)]
pub struct LogContext {
    attrs: Arc<BTreeMap<String, AttrValue>>,
}

/// Entered contexts on this thread, innermost last, tagged with the id of
/// the guard that entered them.
type Entry = (u64, LogContext);

thread_local! {
    static CURRENT: RefCell<Vec<Entry>> = const { RefCell::new(Vec::new()) };
}

static GUARD_ID: AtomicU64 = AtomicU64::new(0);

impl LogContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// New context holding every attribute of `self` plus `attrs`.
    ///
    /// A key already present is overwritten; later entries in `attrs` win
    /// over earlier ones.
    pub fn with_attributes<I, A>(&self, attrs: I) -> LogContext
    where
        I: IntoIterator<Item = A>,
        A: Into<Attr>,
    {
        let mut attrs = attrs.into_iter().map(Into::<Attr>::into).peekable();
        if attrs.peek().is_none() {
            return self.clone();
        }

        let mut merged = (*self.attrs).clone();
        for attr in attrs {
            merged.insert(attr.key, attr.value);
        }
        LogContext {
            attrs: Arc::new(merged),
        }
    }

    /// Shorthand for a single attribute.
    pub fn with(&self, key: impl Into<String>, value: impl Into<AttrValue>) -> LogContext {
        self.with_attributes([Attr::new(key, value)])
    }

    /// Attributes in ascending key order.
    pub fn attributes(&self) -> Vec<Attr> {
        self.iter()
            .map(|(key, value)| Attr::new(key, value.clone()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The innermost context entered on this thread, or an empty one.
    pub fn current() -> LogContext {
        CURRENT
            .try_with(|stack| stack.borrow().last().map(|(_, ctx)| ctx.clone()))
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Make this context current on this thread until the guard drops.
    ///
    /// Dropping the guard removes this context and anything entered after
    /// it, never contexts entered before it.
    pub fn enter(&self) -> ContextGuard {
        let id = GUARD_ID.fetch_add(1, Ordering::Relaxed);
        CURRENT.with(|stack| stack.borrow_mut().push((id, self.clone())));
        ContextGuard {
            id,
            _not_send: PhantomData,
        }
    }

    /// Run `f` with this context current.
    pub fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = self.enter();
        f()
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.attrs.iter()).finish()
    }
}

/// Keeps a [`LogContext`] current until dropped. Not `Send`: it refers to
/// the entering thread.
#[must_use = "the context is only current while the guard is alive"]
pub struct ContextGuard {
    id: u64,
    _not_send: PhantomData<*const ()>,
}

impl ContextGuard {
    /// Remove and return the entries pushed after this guard's own.
    fn take_above(&self) -> Vec<Entry> {
        CURRENT
            .try_with(|stack| {
                let mut stack = stack.borrow_mut();
                match stack.iter().rposition(|(id, _)| *id == self.id) {
                    Some(pos) => stack.split_off(pos + 1),
                    None => Vec::new(),
                }
            })
            .unwrap_or_default()
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let _ = CURRENT.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|(id, _)| *id == self.id) {
                stack.truncate(pos);
            }
        });
    }
}

/// Future that makes a [`LogContext`] current during each poll.
///
/// Contexts the inner future enters and still holds when it returns
/// `Pending` are lifted off the thread and put back on the next poll.
#[pin_project]
pub struct WithLogContext<F> {
    #[pin]
    inner: F,
    context: LogContext,
    suspended: Vec<Entry>,
}

impl<F: Future> Future for WithLogContext<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let guard = this.context.enter();
        let suspended = std::mem::take(this.suspended);
        CURRENT.with(|stack| stack.borrow_mut().extend(suspended));

        let result = this.inner.poll(cx);

        *this.suspended = guard.take_above();
        result
    }
}

pub trait FutureExt: Future + Sized {
    /// Run this future with `context` current, across await points and
    /// worker-thread migrations.
    fn with_log_context(self, context: LogContext) -> WithLogContext<Self>;
}

impl<F: Future> FutureExt for F {
    fn with_log_context(self, context: LogContext) -> WithLogContext<Self> {
        WithLogContext {
            inner: self,
            context,
            suspended: Vec::new(),
        }
    }
}
