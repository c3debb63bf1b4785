//! Closed sets of one-letter codes used by coded columns.

use std::fmt;
use std::str::FromStr;

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted code, in declaration order.
            pub const CODES: &'static [&'static str] = &[$($code),+];

            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($code => Ok($name::$variant),)+
                    other => Err(format!(
                        "Unknown {} code: '{}'. Expected one of {:?}",
                        stringify!($name),
                        other,
                        Self::CODES
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

coded_enum! {
    /// `log_localidade.loc_in_sit`
    LocalitySituation {
        /// Not coded at street level
        NotCoded => "0",
        /// Coded at street level
        Coded => "1",
        /// District or village included in street-level coding
        DistrictCoded => "2",
        /// Street-level coding in progress
        CodingInProgress => "3",
    }
}

coded_enum! {
    /// `log_localidade.loc_in_tipo_loc`
    LocalityType {
        District => "D",
        Municipality => "M",
        Village => "P",
    }
}

coded_enum! {
    /// `log_faixa_localidade.loc_tipo_faixa`
    CepRangeType {
        /// Whole locality
        Total => "T",
        /// Urban seat only
        UrbanSeat => "C",
    }
}

coded_enum! {
    /// `log_num_sec.sec_in_lado`
    SectionSide {
        Both => "A",
        Even => "P",
        Odd => "I",
        Right => "D",
        Left => "E",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in LocalitySituation::CODES {
            let parsed: LocalitySituation = code.parse().unwrap();
            assert_eq!(parsed.code(), *code);
        }
        assert_eq!("M".parse::<LocalityType>().unwrap(), LocalityType::Municipality);
        assert_eq!(SectionSide::Odd.to_string(), "I");
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!("X".parse::<CepRangeType>().is_err());
        assert!("".parse::<LocalityType>().is_err());
    }
}
