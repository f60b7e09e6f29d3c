use crate::{core::ActionScope, Error};

#[cfg(test)]
mod tests;

/// Runs `f` inside an action scope.
///
/// Writes made by `f` are batched: when the outermost scope exits, every reaction depending on
/// something that changed runs exactly once. Nested calls extend the outer batch.
///
/// The flush happens even if `f` fails, since its writes up to that point are applied.
/// An error from `f` takes precedence over an error from the flush.
pub fn action<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<T, E>
where
    E: From<Error>,
{
    let scope = ActionScope::enter();
    let ret = f();
    let flushed = scope.exit();
    let value = ret?;
    flushed?;
    Ok(value)
}

/// Wraps `f` so that every call runs inside [`action`].
///
/// This is how a store declares its mutating methods.
pub fn action_fn<A, T, E>(f: impl Fn(A) -> Result<T, E>) -> impl Fn(A) -> Result<T, E>
where
    E: From<Error>,
{
    move |arg| action(|| f(arg))
}
