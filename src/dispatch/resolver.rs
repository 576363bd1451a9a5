//! Token-to-typed-argument resolution.
//!
//! Converts the ordered raw tokens of a command line into the typed argument
//! list a handler declares, applying a fixed precedence: a lone trailing
//! collector takes everything, arity is checked next, then each token is
//! converted in declared parameter order. The first failure wins; a handler
//! never sees a partially resolved argument list.

use crate::dispatch::context::NodeResolver;
use crate::error::ArgumentError;
use crate::value::NodeRef;

/// Declared type of one handler parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `true`/`false`, or the parameter's own name for flag-style invocation.
    Bool,
    /// Integer, parsed with invariant formatting.
    Int,
    /// Float, parsed with invariant formatting.
    Float,
    /// Token passed through verbatim.
    Str,
    /// Host object resolved by name through the node resolver.
    Node,
    /// Trailing collector: receives all remaining tokens as a sequence.
    Collector,
}

/// One declared parameter: its name and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    ty: ParamType,
}

impl ParamSpec {
    /// Declare a parameter of an explicit type.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Declare a boolean parameter.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    /// Declare an integer parameter.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Int)
    }

    /// Declare a float parameter.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Float)
    }

    /// Declare a string parameter.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Str)
    }

    /// Declare a node-typed parameter.
    pub fn node(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Node)
    }

    /// Declare the trailing collector parameter.
    pub fn collector(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Collector)
    }

    /// Declared name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type.
    pub fn ty(&self) -> ParamType {
        self.ty
    }
}

/// One fully typed resolved argument.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Resolved boolean.
    Bool(bool),
    /// Resolved integer.
    Int(i64),
    /// Resolved float.
    Float(f64),
    /// Pass-through string.
    Str(String),
    /// Resolved host object.
    Node(NodeRef),
    /// Remaining tokens gathered by the trailing collector.
    Collected(Vec<String>),
}

/// Positional argument list handed to a handler body.
///
/// Accessors are typed and positional; they return `None` when the position
/// is out of range or holds a different type, which in a correctly registered
/// handler indicates a signature/body mismatch.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    /// Number of resolved arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// Boolean at `index`.
    pub fn bool(&self, index: usize) -> Option<bool> {
        match self.0.get(index) {
            Some(Arg::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Integer at `index`.
    pub fn int(&self, index: usize) -> Option<i64> {
        match self.0.get(index) {
            Some(Arg::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Float at `index`. Integer arguments widen.
    pub fn float(&self, index: usize) -> Option<f64> {
        match self.0.get(index) {
            Some(Arg::Float(f)) => Some(*f),
            Some(Arg::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    /// String at `index`.
    pub fn str(&self, index: usize) -> Option<&str> {
        match self.0.get(index) {
            Some(Arg::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Node handle at `index`.
    pub fn node(&self, index: usize) -> Option<&NodeRef> {
        match self.0.get(index) {
            Some(Arg::Node(n)) => Some(n),
            _ => None,
        }
    }

    /// Collected token sequence at `index`.
    pub fn collected(&self, index: usize) -> Option<&[String]> {
        match self.0.get(index) {
            Some(Arg::Collected(v)) => Some(v),
            _ => None,
        }
    }
}

/// Resolve `tokens` against a declared parameter list.
///
/// `node_resolver` is the effective resolver for node-typed parameters: the
/// handler's named injector when one is set, otherwise the context's.
pub(crate) fn resolve_args(
    params: &[ParamSpec],
    tokens: &[String],
    node_resolver: Option<&NodeResolver>,
) -> Result<Args, ArgumentError> {
    // A lone collector takes everything, any count including zero.
    if params.len() == 1 && params[0].ty == ParamType::Collector {
        return Ok(Args(vec![Arg::Collected(tokens.to_vec())]));
    }

    let has_collector = params.last().is_some_and(|p| p.ty == ParamType::Collector);
    let fixed = if has_collector {
        params.len() - 1
    } else {
        params.len()
    };

    if tokens.len() < fixed || (!has_collector && tokens.len() != fixed) {
        return Err(ArgumentError::ArityMismatch {
            expected: fixed,
            got: tokens.len(),
        });
    }

    let mut args = Vec::with_capacity(params.len());
    for (param, token) in params[..fixed].iter().zip(tokens) {
        args.push(convert(param, token, node_resolver)?);
    }
    if has_collector {
        args.push(Arg::Collected(tokens[fixed..].to_vec()));
    }
    Ok(Args(args))
}

/// Convert one token per the declared parameter type.
fn convert(
    param: &ParamSpec,
    token: &str,
    node_resolver: Option<&NodeResolver>,
) -> Result<Arg, ArgumentError> {
    match param.ty {
        ParamType::Bool => {
            if token.eq_ignore_ascii_case("true") {
                Ok(Arg::Bool(true))
            } else if token.eq_ignore_ascii_case("false") {
                Ok(Arg::Bool(false))
            } else if token.eq_ignore_ascii_case(&param.name) {
                // Flag-style: `fade_out wait` sets the `wait` parameter.
                Ok(Arg::Bool(true))
            } else {
                Err(ArgumentError::InvalidBool {
                    param: param.name.clone(),
                    token: token.to_string(),
                })
            }
        }
        ParamType::Int => token.parse::<i64>().map(Arg::Int).map_err(|_| {
            ArgumentError::InvalidNumber {
                param: param.name.clone(),
                token: token.to_string(),
            }
        }),
        ParamType::Float => token.parse::<f64>().map(Arg::Float).map_err(|_| {
            ArgumentError::InvalidNumber {
                param: param.name.clone(),
                token: token.to_string(),
            }
        }),
        ParamType::Str => Ok(Arg::Str(token.to_string())),
        ParamType::Node => {
            let resolver = node_resolver.ok_or_else(|| ArgumentError::NoNodeResolver {
                param: param.name.clone(),
            })?;
            resolver(token)
                .map(Arg::Node)
                .ok_or_else(|| ArgumentError::UnresolvedNode {
                    param: param.name.clone(),
                    token: token.to_string(),
                })
        }
        // Registration validates that a collector is last; the fixed slice
        // above never includes it.
        ParamType::Collector => unreachable!("collector parameter in fixed position"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn toks(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bool_accepts_literals_and_parameter_name() {
        let params = [ParamSpec::bool("wait")];
        for token in ["true", "Wait", "WAIT"] {
            let args = resolve_args(&params, &toks(&[token]), None).unwrap();
            assert_eq!(args.bool(0), Some(true), "token {token:?}");
        }
        let args = resolve_args(&params, &toks(&["false"]), None).unwrap();
        assert_eq!(args.bool(0), Some(false));

        let err = resolve_args(&params, &toks(&["maybe"]), None).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::InvalidBool {
                param: "wait".into(),
                token: "maybe".into(),
            }
        );
    }

    #[test]
    fn test_lone_collector_takes_any_count() {
        let params = [ParamSpec::collector("lines")];
        for count in 0..4 {
            let tokens: Vec<String> = (0..count).map(|i| format!("t{i}")).collect();
            let args = resolve_args(&params, &tokens, None).unwrap();
            assert_eq!(args.collected(0).unwrap().len(), count);
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let params = [ParamSpec::string("a"), ParamSpec::string("b")];
        let err = resolve_args(&params, &toks(&["only"]), None).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::ArityMismatch {
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn test_trailing_collector_after_fixed_params() {
        let params = [ParamSpec::string("target"), ParamSpec::collector("rest")];
        let args = resolve_args(&params, &toks(&["door", "x", "y"]), None).unwrap();
        assert_eq!(args.str(0), Some("door"));
        assert_eq!(args.collected(1), Some(&["x".to_string(), "y".to_string()][..]));

        // The fixed prefix is still required.
        let err = resolve_args(&params, &toks(&[]), None).unwrap_err();
        assert_eq!(
            err,
            ArgumentError::ArityMismatch {
                expected: 1,
                got: 0,
            }
        );
    }

    #[test]
    fn test_numeric_parsing_is_invariant() {
        let params = [ParamSpec::int("count"), ParamSpec::float("speed")];
        let args = resolve_args(&params, &toks(&["-3", "2.5"]), None).unwrap();
        assert_eq!(args.int(0), Some(-3));
        assert_eq!(args.float(1), Some(2.5));

        // Comma decimal separators are not accepted.
        let err = resolve_args(&params, &toks(&["1", "2,5"]), None).unwrap_err();
        assert_eq!(err.error_code(), "invalid_number");
    }

    #[test]
    fn test_node_resolution() {
        let params = [ParamSpec::node("target")];
        let resolver: NodeResolver = Arc::new(|key: &str| {
            (key == "door").then(|| crate::value::NodeRef::new(7_u32))
        });

        let args = resolve_args(&params, &toks(&["door"]), Some(&resolver)).unwrap();
        assert_eq!(args.node(0).unwrap().downcast_ref::<u32>(), Some(&7));

        let err = resolve_args(&params, &toks(&["window"]), Some(&resolver)).unwrap_err();
        assert_eq!(err.error_code(), "unresolved_node");

        let err = resolve_args(&params, &toks(&["door"]), None).unwrap_err();
        assert_eq!(err.error_code(), "no_node_resolver");
    }
}
