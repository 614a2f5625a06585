use half::{bf16, f16};
use tessel_core::{cast, DType};

#[test]
fn element_sizes() {
    assert_eq!(DType::Byte.size_in_bytes(), 1);
    assert_eq!(DType::Bool.size_in_bytes(), 1);
    assert_eq!(DType::I16.size_in_bytes(), 2);
    assert_eq!(DType::F16.size_in_bytes(), 2);
    assert_eq!(DType::BF16.size_in_bytes(), 2);
    assert_eq!(DType::F32.size_in_bytes(), 4);
    assert_eq!(DType::U64.size_in_bytes(), 8);
    assert_eq!(DType::F64.size_in_bytes(), 8);
}

#[test]
fn dtype_parsing() {
    let dt: DType = "bf16".parse().unwrap();
    assert_eq!(dt, DType::BF16);
    assert_eq!(dt.as_str(), "bf16");
    assert!("float80".parse::<DType>().is_err());
    assert!(DType::F16.is_float());
    assert!(!DType::I32.is_float());
    assert!(DType::U8.is_int());
    assert!(!DType::Bool.is_int());
}

#[test]
fn f16_roundtrip() {
    for v in [0f32, 1., -1., 0.5, 65504., -65504., 0.0009765625] {
        let h: f16 = cast(v);
        let back: f32 = cast(h);
        assert_eq!(back, v);
    }
}

#[test]
fn f16_specials() {
    let h: f16 = cast(f32::NAN);
    assert!(h.is_nan());
    let h: f16 = cast(f32::INFINITY);
    assert_eq!(h, f16::INFINITY);
    let h: f16 = cast(f32::NEG_INFINITY);
    assert_eq!(h, f16::NEG_INFINITY);
    // Above the f16 range the narrowing overflows to infinity.
    let h: f16 = cast(1e6f32);
    assert_eq!(h, f16::INFINITY);
    // f16 subnormals survive the narrowing.
    let h: f16 = cast(6e-8f32);
    assert!(h.to_f32() > 0.);
}

#[test]
fn bf16_narrowing() {
    let h: bf16 = cast(1.0f32);
    assert_eq!(h.to_f32(), 1.0);
    // bf16 keeps the f32 exponent range.
    let h: bf16 = cast(1e38f32);
    assert!(h.is_finite());
    let h: bf16 = cast(f64::NAN);
    assert!(h.is_nan());
    // Round to nearest even on the dropped mantissa bits: 1 + 2^-8 sits
    // exactly between 1.0 and 1 + 2^-7 and resolves to the even mantissa.
    let h: bf16 = cast(1.00390625f32);
    assert_eq!(h.to_f32(), 1.0);
    let h: bf16 = cast(1.0078125f32);
    assert_eq!(h.to_f32(), 1.0078125);
}

#[test]
fn float_to_int_rounds_ties_to_even() {
    assert_eq!(cast::<f32, i32>(2.5), 2);
    assert_eq!(cast::<f32, i32>(3.5), 4);
    assert_eq!(cast::<f32, i32>(-2.5), -2);
    assert_eq!(cast::<f32, i32>(0.4999), 0);
    assert_eq!(cast::<f64, i64>(1e9 + 0.75), 1_000_000_001);
}

#[test]
fn float_to_int_saturates() {
    assert_eq!(cast::<f64, i8>(1000.), 127);
    assert_eq!(cast::<f64, i8>(-1000.), -128);
    assert_eq!(cast::<f32, u8>(-4.), 0);
    assert_eq!(cast::<f32, u16>(1e9), u16::MAX);
}

#[test]
fn bool_conversions() {
    assert_eq!(cast::<bool, f32>(true), 1.);
    assert_eq!(cast::<bool, f32>(false), 0.);
    assert_eq!(cast::<bool, i32>(true), 1);
    assert!(cast::<f32, bool>(2.));
    assert!(!cast::<f32, bool>(0.));
    assert!(cast::<i64, bool>(-1));
}

#[test]
fn int_float_crossings() {
    assert_eq!(cast::<i64, f16>(2), f16::from_f32(2.));
    assert_eq!(cast::<f16, i32>(f16::from_f32(7.)), 7);
    assert_eq!(cast::<u32, bf16>(4), bf16::from_f32(4.));
    assert_eq!(cast::<i8, f64>(-128), -128.);
}
