//! The `math` module: floating point helpers over `f64`.

use std::f64::consts;

use serde_json::Value;

use super::{NativeModule, float_result, value_result};
use crate::error::InvocationError;
use crate::host::Returned;
use crate::signature::{BoundArgs, Param};

const DOMAIN_ERROR: &str = "math domain error";
const DEFAULT_REL_TOL: f64 = 1e-9;

/// Largest magnitude that still converts to `i64` without saturating.
const INTEGRAL_LIMIT: f64 = 9_007_199_254_740_992.0;

pub(super) fn module() -> NativeModule {
    NativeModule::new("math")
        .constant("pi", float_constant(consts::PI))
        .constant("e", float_constant(consts::E))
        .constant("tau", float_constant(consts::TAU))
        .function("sqrt", &[Param::required("x")], sqrt)
        .function("pow", &[Param::required("x"), Param::required("y")], pow)
        .function("exp", &[Param::required("x")], exp)
        .function("log", &[Param::required("x"), Param::optional("base")], log)
        .function("floor", &[Param::required("x")], floor)
        .function("ceil", &[Param::required("x")], ceil)
        .function("fabs", &[Param::required("x")], fabs)
        .function("hypot", &[Param::variadic("coordinates")], hypot)
        .function("sin", &[Param::required("x")], sin)
        .function("cos", &[Param::required("x")], cos)
        .function("tan", &[Param::required("x")], tan)
        .function(
            "isclose",
            &[
                Param::required("a"),
                Param::required("b"),
                Param::optional("rel_tol"),
                Param::optional("abs_tol"),
            ],
            isclose,
        )
        .function("factorial", &[Param::required("x")], factorial)
}

fn float_constant(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Rejects NaN produced from finite inputs before it reaches the wire.
fn checked(args: &BoundArgs, value: f64) -> Result<Returned, InvocationError> {
    if value.is_nan() {
        return Err(InvocationError::value_error(args.function(), DOMAIN_ERROR));
    }
    float_result(args.function(), value)
}

fn domain_error(args: &BoundArgs) -> InvocationError {
    InvocationError::value_error(args.function(), DOMAIN_ERROR)
}

fn sqrt(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let x = args.f64("x")?;
    if x < 0.0 {
        return Err(domain_error(args));
    }
    checked(args, x.sqrt())
}

fn pow(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let (x, y) = (args.f64("x")?, args.f64("y")?);
    if x == 0.0 && y < 0.0 {
        return Err(domain_error(args));
    }
    checked(args, x.powf(y))
}

fn exp(args: &BoundArgs) -> Result<Returned, InvocationError> {
    checked(args, args.f64("x")?.exp())
}

fn log(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let x = args.f64("x")?;
    if x <= 0.0 {
        return Err(domain_error(args));
    }
    match args.opt_f64("base")? {
        None => checked(args, x.ln()),
        Some(base) if base <= 0.0 => Err(domain_error(args)),
        Some(base) if (base - 1.0).abs() < f64::EPSILON => Err(InvocationError::value_error(
            args.function(),
            "float division by zero",
        )),
        Some(base) => checked(args, x.ln() / base.ln()),
    }
}

fn integral(args: &BoundArgs, value: f64) -> Result<Returned, InvocationError> {
    if !value.is_finite() {
        return Err(InvocationError::value_error(
            args.function(),
            "cannot convert a non-finite float to an integer",
        ));
    }
    if value.abs() >= INTEGRAL_LIMIT {
        return float_result(args.function(), value);
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is integral and bounded by INTEGRAL_LIMIT"
    )]
    let whole = value as i64;
    value_result(whole)
}

fn floor(args: &BoundArgs) -> Result<Returned, InvocationError> {
    integral(args, args.f64("x")?.floor())
}

fn ceil(args: &BoundArgs) -> Result<Returned, InvocationError> {
    integral(args, args.f64("x")?.ceil())
}

fn fabs(args: &BoundArgs) -> Result<Returned, InvocationError> {
    checked(args, args.f64("x")?.abs())
}

fn hypot(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let mut total = 0.0_f64;
    for coordinate in args.rest("coordinates") {
        let value = coordinate.as_f64().ok_or_else(|| {
            InvocationError::type_error(args.function(), "coordinates must be numbers")
        })?;
        total = total.hypot(value);
    }
    checked(args, total)
}

fn sin(args: &BoundArgs) -> Result<Returned, InvocationError> {
    trig(args, f64::sin)
}

fn cos(args: &BoundArgs) -> Result<Returned, InvocationError> {
    trig(args, f64::cos)
}

fn tan(args: &BoundArgs) -> Result<Returned, InvocationError> {
    trig(args, f64::tan)
}

fn trig(args: &BoundArgs, op: fn(f64) -> f64) -> Result<Returned, InvocationError> {
    let x = args.f64("x")?;
    if x.is_infinite() {
        return Err(domain_error(args));
    }
    checked(args, op(x))
}

fn isclose(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let (a, b) = (args.f64("a")?, args.f64("b")?);
    let rel_tol = args.opt_f64("rel_tol")?.unwrap_or(DEFAULT_REL_TOL);
    let abs_tol = args.opt_f64("abs_tol")?.unwrap_or(0.0);
    if rel_tol < 0.0 || abs_tol < 0.0 {
        return Err(InvocationError::value_error(
            args.function(),
            "tolerances must be non-negative",
        ));
    }
    #[expect(clippy::float_cmp, reason = "exact equality short-circuits infinities")]
    let identical = a == b;
    let close = identical || (a - b).abs() <= (rel_tol * a.abs().max(b.abs())).max(abs_tol);
    value_result(close)
}

fn factorial(args: &BoundArgs) -> Result<Returned, InvocationError> {
    let n = args.u64("x")?;
    (1..=n)
        .try_fold(1_u64, u64::checked_mul)
        .map(Value::from)
        .map(Returned::Value)
        .ok_or_else(|| InvocationError::value_error(args.function(), "factorial result too large"))
}
