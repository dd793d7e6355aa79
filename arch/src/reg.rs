use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Reg {
    #[default]
    Zero,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
}

impl Reg {
    /// Registers handed out to expression evaluation.
    pub const TEMPS: [Reg; 18] = [
        Reg::T0,
        Reg::T1,
        Reg::T2,
        Reg::T3,
        Reg::T4,
        Reg::T5,
        Reg::T6,
        Reg::T7,
        Reg::T8,
        Reg::T9,
        Reg::S0,
        Reg::S1,
        Reg::S2,
        Reg::S3,
        Reg::S4,
        Reg::S5,
        Reg::S6,
        Reg::S7,
    ];

    /// Argument registers, in order.
    pub const ARGS: [Reg; 4] = [Reg::A0, Reg::A1, Reg::A2, Reg::A3];

    /// Accepts `$t0`, `t0`, `$T0` or the numeric form `$8`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let name = s.trim().trim_start_matches('$');
        if let Ok(num) = name.parse::<u8>() {
            return match num {
                0..=31 => Ok(Reg::from(num)),
                _ => Err(format!("Unknown reg name: {s}")),
            };
        }
        match name.to_ascii_lowercase().parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Unknown reg name: {s}")),
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display() {
        assert_eq!(Reg::Zero.to_string(), "$zero");
        assert_eq!(Reg::T9.to_string(), "$t9");
        assert_eq!(Reg::Fp.to_string(), "$fp");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Reg::parse("$s2"), Ok(Reg::S2));
        assert_eq!(Reg::parse("ra"), Ok(Reg::Ra));
        assert_eq!(Reg::parse("$SP"), Ok(Reg::Sp));
        assert_eq!(Reg::parse("$8"), Ok(Reg::T0));
        assert!(Reg::parse("$hoge").is_err());
        assert!(Reg::parse("$32").is_err());
    }

    #[test]
    fn test_numbering() {
        for (num, reg) in Reg::iter().enumerate() {
            assert_eq!(u8::from(reg) as usize, num);
            assert_eq!(Reg::parse(&reg.to_string()), Ok(reg));
        }
        assert_eq!(u8::from(Reg::Ra), 31);
    }
}
