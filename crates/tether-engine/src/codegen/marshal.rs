//! Conversions at the binding boundary, shared by generated accessors and
//! the fallback invoker

use crate::convert::Converter;
use crate::error::{AccessError, AccessResult};
use crate::runtime::{HostError, Value};
use crate::signature::TypeRef;

/// Convert a consumer value into the target's type
pub(crate) fn to_target(
    converter: &dyn Converter,
    member: &str,
    value: Value,
    declared: &TypeRef,
    actual: &TypeRef,
) -> AccessResult<Value> {
    converter
        .convert(value, declared, actual)
        .map_err(|source| AccessError::Conversion {
            member: member.to_string(),
            source,
        })
}

/// Convert consumer arguments into the target's parameter types
pub(crate) fn args_to_target(
    converter: &dyn Converter,
    member: &str,
    args: &[Value],
    declared: &[TypeRef],
    actual: &[TypeRef],
) -> AccessResult<Vec<Value>> {
    args.iter()
        .zip(declared.iter().zip(actual))
        .map(|(arg, (d, a))| to_target(converter, member, arg.clone(), d, a))
        .collect()
}

/// Convert a target value back into the consumer's declared type
pub(crate) fn to_consumer(
    converter: &dyn Converter,
    member: &str,
    value: Value,
    actual: &TypeRef,
    declared: &TypeRef,
) -> AccessResult<Value> {
    converter
        .convert(value, actual, declared)
        .map_err(|source| AccessError::Conversion {
            member: member.to_string(),
            source,
        })
}

/// Wrap a host failure, keeping it as the source
pub(crate) fn host<T>(member: &str, result: Result<T, HostError>) -> AccessResult<T> {
    result.map_err(|source| AccessError::Invocation {
        member: member.to_string(),
        source,
    })
}
