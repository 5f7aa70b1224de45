//! Parsing of ETS model specifications into a candidate search space.
//!
//! A specification has one letter per component, `[E][T][S]`, or four letters
//! `[E][T][D][S]` where `D` fixes the damping policy. `Z` searches every
//! admissible value of a component.

use std::fmt;

use super::ets::{ErrorType, SeasonalType, TrendType};
use crate::error::{ForecastError, Result};

/// Whether damped trends are searched, forced or excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DampedPolicy {
    /// Try both damped and undamped trends.
    #[default]
    Auto,
    /// Damped trends only.
    Always,
    /// Undamped trends only.
    Never,
}

/// One point of the search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandidateConfig {
    pub error: ErrorType,
    /// Trend kind; damping is carried separately in `damped`.
    pub trend: TrendType,
    pub season: SeasonalType,
    pub damped: bool,
}

impl CandidateConfig {
    /// Trend type with damping folded in.
    pub fn trend_type(&self) -> TrendType {
        self.trend.with_damping(self.damped)
    }

    pub fn requires_positive(&self) -> bool {
        self.error == ErrorType::Multiplicative
            || self.trend.is_multiplicative()
            || self.season == SeasonalType::Multiplicative
    }
}

impl fmt::Display for CandidateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = match self.error {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        };
        let t = match self.trend_type() {
            TrendType::None => "N",
            TrendType::Additive => "A",
            TrendType::AdditiveDamped => "Ad",
            TrendType::Multiplicative => "M",
            TrendType::MultiplicativeDamped => "Md",
        };
        let s = match self.season {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        };
        write!(f, "ETS({},{},{})", e, t, s)
    }
}

/// Parsed specification: the admissible values of every component.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSearchSpace {
    errors: Vec<ErrorType>,
    trends: Vec<TrendType>,
    seasons: Vec<SeasonalType>,
    season_length: usize,
    damped_policy: DampedPolicy,
    trend_letter: char,
}

impl CandidateSearchSpace {
    /// Parse a three or four letter specification such as `"ZZZ"` or `"MAdN"`.
    pub fn parse(spec: &str, season_length: usize) -> Result<Self> {
        if season_length == 0 {
            return Err(ForecastError::InvalidParameter(
                "season length must be positive".to_string(),
            ));
        }

        let letters: Vec<char> = spec.chars().collect();
        let (error, trend, season, damped_policy) = match letters.as_slice() {
            [e, t, s] => (*e, *t, *s, DampedPolicy::Auto),
            [e, t, d, s] => {
                let policy = match d {
                    'd' | 'D' => DampedPolicy::Always,
                    'n' | 'N' => DampedPolicy::Never,
                    'z' | 'Z' => DampedPolicy::Auto,
                    other => return Err(unknown_letter("damping", *other)),
                };
                (*e, *t, *s, policy)
            }
            _ => {
                return Err(ForecastError::InvalidParameter(format!(
                    "model specification must have 3 or 4 letters, got {:?}",
                    spec
                )))
            }
        };

        if error == 'N' {
            return Err(ForecastError::InvalidParameter(
                "error component cannot be 'N'".to_string(),
            ));
        }
        if error == 'A' && (trend == 'M' || season == 'M') {
            return Err(ForecastError::InvalidParameter(format!(
                "additive error cannot be combined with multiplicative components in {:?}",
                spec
            )));
        }
        if error == 'M' && trend == 'M' && season == 'M' {
            return Err(ForecastError::InvalidParameter(
                "fully multiplicative specification is not supported".to_string(),
            ));
        }

        let errors = match error {
            'A' => vec![ErrorType::Additive],
            'M' => vec![ErrorType::Multiplicative],
            'Z' => vec![ErrorType::Additive, ErrorType::Multiplicative],
            other => return Err(unknown_letter("error", other)),
        };

        let trends = match trend {
            'N' => vec![TrendType::None],
            'A' => vec![TrendType::Additive],
            'M' => vec![TrendType::Multiplicative],
            'Z' => vec![
                TrendType::None,
                TrendType::Additive,
                TrendType::Multiplicative,
            ],
            other => return Err(unknown_letter("trend", other)),
        };

        let seasons = match season {
            'N' => vec![SeasonalType::None],
            'A' | 'M' if season_length < 2 => {
                return Err(ForecastError::InvalidParameter(format!(
                    "seasonal specification requires season length >= 2, got {}",
                    season_length
                )))
            }
            'A' => vec![SeasonalType::Additive],
            'M' => vec![SeasonalType::Multiplicative],
            'Z' if season_length < 2 => vec![SeasonalType::None],
            'Z' => vec![
                SeasonalType::None,
                SeasonalType::Additive,
                SeasonalType::Multiplicative,
            ],
            other => return Err(unknown_letter("season", other)),
        };

        Ok(Self {
            errors,
            trends,
            seasons,
            season_length,
            damped_policy,
            trend_letter: trend,
        })
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }

    /// Damping policy implied by the specification.
    pub fn damped_policy(&self) -> DampedPolicy {
        self.damped_policy
    }

    /// Whether any trend other than `N` is admissible.
    pub fn has_trend_option(&self) -> bool {
        self.trends.iter().any(|t| t.has_trend())
    }

    /// Enumerate candidates admissible for `values`.
    ///
    /// Order is error, then trend, then season, then undamped before damped.
    /// Multiplicative components are dropped when the data has a
    /// non-positive value, and a multiplicative trend reached through `Z`
    /// only appears when `allow_multiplicative_trend` is set.
    pub fn enumerate_candidates(
        &self,
        values: &[f64],
        allow_multiplicative_trend: bool,
        damped_policy: DampedPolicy,
    ) -> Vec<CandidateConfig> {
        let non_positive = values.iter().any(|&v| v <= 0.0);
        let mut out = Vec::new();

        for &error in &self.errors {
            let multiplicative_error = error == ErrorType::Multiplicative;
            if multiplicative_error && non_positive {
                continue;
            }
            for &trend in &self.trends {
                if trend.is_multiplicative() {
                    if non_positive || error == ErrorType::Additive {
                        continue;
                    }
                    if self.trend_letter == 'Z' && !allow_multiplicative_trend {
                        continue;
                    }
                }
                for &season in &self.seasons {
                    match season {
                        SeasonalType::Multiplicative if non_positive => continue,
                        SeasonalType::Multiplicative if !multiplicative_error => continue,
                        SeasonalType::Additive if multiplicative_error => continue,
                        _ => {}
                    }
                    if trend.is_multiplicative() && season == SeasonalType::Multiplicative {
                        continue;
                    }
                    for damped in damped_options(trend, damped_policy) {
                        out.push(CandidateConfig {
                            error,
                            trend,
                            season,
                            damped,
                        });
                    }
                }
            }
        }

        out
    }
}

fn damped_options(trend: TrendType, policy: DampedPolicy) -> Vec<bool> {
    if !trend.has_trend() {
        return vec![false];
    }
    match policy {
        DampedPolicy::Auto => vec![false, true],
        DampedPolicy::Always => vec![true],
        DampedPolicy::Never => vec![false],
    }
}

fn unknown_letter(component: &str, letter: char) -> ForecastError {
    ForecastError::InvalidParameter(format!(
        "unsupported {} specification letter {:?}",
        component, letter
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(candidates: &[CandidateConfig]) -> Vec<String> {
        candidates.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn fixed_spec_collapses_to_one_candidate() {
        let space = CandidateSearchSpace::parse("ANN", 1).unwrap();
        let candidates = space.enumerate_candidates(&[1.0, 2.0], false, DampedPolicy::Auto);
        assert_eq!(labels(&candidates), vec!["ETS(A,N,N)"]);
    }

    #[test]
    fn full_search_on_positive_seasonal_data() {
        let space = CandidateSearchSpace::parse("ZZZ", 4).unwrap();
        let candidates = space.enumerate_candidates(&[1.0, 2.0, 3.0], false, DampedPolicy::Auto);
        assert_eq!(
            labels(&candidates),
            vec![
                "ETS(A,N,N)",
                "ETS(A,N,A)",
                "ETS(A,A,N)",
                "ETS(A,Ad,N)",
                "ETS(A,A,A)",
                "ETS(A,Ad,A)",
                "ETS(M,N,N)",
                "ETS(M,N,M)",
                "ETS(M,A,N)",
                "ETS(M,Ad,N)",
                "ETS(M,A,M)",
                "ETS(M,Ad,M)",
            ]
        );
    }

    #[test]
    fn non_positive_data_drops_multiplicative_components() {
        let space = CandidateSearchSpace::parse("ZZZ", 4).unwrap();
        let candidates = space.enumerate_candidates(&[1.0, 0.0, 3.0], true, DampedPolicy::Auto);
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| !c.requires_positive()));
    }

    #[test]
    fn multiplicative_trend_needs_flag_unless_explicit() {
        let auto = CandidateSearchSpace::parse("ZZN", 1).unwrap();
        let values = [1.0, 2.0, 3.0];
        assert!(auto
            .enumerate_candidates(&values, false, DampedPolicy::Auto)
            .iter()
            .all(|c| !c.trend.is_multiplicative()));
        assert!(auto
            .enumerate_candidates(&values, true, DampedPolicy::Auto)
            .iter()
            .any(|c| c.trend.is_multiplicative()));

        let explicit = CandidateSearchSpace::parse("MMN", 1).unwrap();
        let candidates = explicit.enumerate_candidates(&values, false, DampedPolicy::Auto);
        assert_eq!(labels(&candidates), vec!["ETS(M,M,N)", "ETS(M,Md,N)"]);
    }

    #[test]
    fn four_letter_spec_sets_damping() {
        let damped = CandidateSearchSpace::parse("AAdN", 1).unwrap();
        assert_eq!(damped.damped_policy(), DampedPolicy::Always);
        let candidates =
            damped.enumerate_candidates(&[1.0, 2.0], false, damped.damped_policy());
        assert_eq!(labels(&candidates), vec!["ETS(A,Ad,N)"]);

        let never = CandidateSearchSpace::parse("AANN", 1).unwrap();
        assert_eq!(never.damped_policy(), DampedPolicy::Never);

        let auto = CandidateSearchSpace::parse("AAZN", 1).unwrap();
        assert_eq!(auto.damped_policy(), DampedPolicy::Auto);
        let lower = CandidateSearchSpace::parse("AAzN", 1).unwrap();
        assert_eq!(lower.damped_policy(), DampedPolicy::Auto);
    }

    #[test]
    fn unknown_damping_letter_is_rejected() {
        for spec in ["AAXN", "AAAN", "AA1N", "ZZ?Z"] {
            match CandidateSearchSpace::parse(spec, 4) {
                Err(ForecastError::InvalidParameter(message)) => {
                    assert!(message.contains("damping"), "{}: {}", spec, message)
                }
                other => panic!("{} should be rejected, got {:?}", spec, other),
            }
        }
    }

    #[test]
    fn seasonal_z_without_period_means_no_season() {
        let space = CandidateSearchSpace::parse("AZZ", 1).unwrap();
        let candidates = space.enumerate_candidates(&[1.0, 2.0], false, DampedPolicy::Never);
        assert!(candidates.iter().all(|c| c.season == SeasonalType::None));
    }

    #[test]
    fn invalid_specifications_are_rejected() {
        for spec in ["NNN", "AMN", "ANM", "AAM", "MMM", "AN", "ANNNN", "AXN", "ANQ"] {
            assert!(
                matches!(
                    CandidateSearchSpace::parse(spec, 4),
                    Err(ForecastError::InvalidParameter(_))
                ),
                "{} should be rejected",
                spec
            );
        }
        assert!(CandidateSearchSpace::parse("ANA", 1).is_err());
        assert!(CandidateSearchSpace::parse("ANN", 0).is_err());
    }

    #[test]
    fn damped_policy_only_affects_trended_candidates() {
        let space = CandidateSearchSpace::parse("AZN", 1).unwrap();
        let always = space.enumerate_candidates(&[1.0], false, DampedPolicy::Always);
        assert_eq!(labels(&always), vec!["ETS(A,N,N)", "ETS(A,Ad,N)"]);
        assert!(space.has_trend_option());
        assert!(!CandidateSearchSpace::parse("ANN", 1)
            .unwrap()
            .has_trend_option());
    }
}
