//! The enumerated per-agent attribute sets and the missing-value sentinel.
//!
//! Every attribute an engine exposes for cross-region synchronization is
//! named here explicitly. There is no string-keyed lookup: the
//! synchronizer iterates [`ScalarAttr::ALL`] and [`VariantAttr::ALL`], and
//! an engine maps each variant to a typed `f64` buffer. The unique agent
//! identity (uid) is deliberately not representable in either enum, so it
//! can never be merged between regions.

/// The numeric sentinel marking an attribute as "not yet set" for an agent.
///
/// Attributes use `f64::NAN` for missing values: a susceptible agent has a
/// missing `DateExposed`, an agent who was never severe has a missing
/// `DurSymToSev`, and so on. Test with [`is_missing`] — never with `==`,
/// which is always false for NaN.
pub const MISSING: f64 = f64::NAN;

/// Returns `true` if `value` is the missing-value sentinel.
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Per-agent scalar attributes synchronized between a traveler's home and
/// visited regions.
///
/// Each variant identifies one `f64` buffer of length `n_agents` on a
/// [`RegionEngine`](crate::traits::RegionEngine). Flags hold 0.0/1.0,
/// dates hold the day number of the event, durations hold day counts,
/// and counts hold running totals. All use [`MISSING`] for "not set".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarAttr {
    /// Agent has never been infected and can be (flag).
    Susceptible,
    /// Agent is exposed but not yet infectious (flag).
    Exposed,
    /// Agent is infectious (flag).
    Infectious,
    /// Agent has symptoms (flag).
    Symptomatic,
    /// Agent has severe disease (flag).
    Severe,
    /// Agent is critically ill (flag).
    Critical,
    /// Agent has recovered (flag).
    Recovered,
    /// Agent has died (flag).
    Dead,
    /// Day the agent was exposed (date).
    DateExposed,
    /// Day the agent became infectious (date).
    DateInfectious,
    /// Day the agent became symptomatic (date).
    DateSymptomatic,
    /// Day the agent became severe (date).
    DateSevere,
    /// Day the agent became critical (date).
    DateCritical,
    /// Day the agent recovered (date).
    DateRecovered,
    /// Day the agent died (date).
    DateDead,
    /// Day the agent entered quarantine (date).
    DateQuarantined,
    /// Duration from exposure to infectiousness (days).
    DurExpToInf,
    /// Duration from infectiousness to symptoms (days).
    DurInfToSym,
    /// Duration from symptoms to severe disease (days).
    DurSymToSev,
    /// Total duration of the disease episode (days).
    DurDisease,
    /// Number of infections this agent has had (count).
    Infections,
    /// Peak neutralizing-antibody level from the last immunizing event.
    PeakNab,
}

impl ScalarAttr {
    /// Every scalar attribute, in synchronization order.
    pub const ALL: [ScalarAttr; 22] = [
        ScalarAttr::Susceptible,
        ScalarAttr::Exposed,
        ScalarAttr::Infectious,
        ScalarAttr::Symptomatic,
        ScalarAttr::Severe,
        ScalarAttr::Critical,
        ScalarAttr::Recovered,
        ScalarAttr::Dead,
        ScalarAttr::DateExposed,
        ScalarAttr::DateInfectious,
        ScalarAttr::DateSymptomatic,
        ScalarAttr::DateSevere,
        ScalarAttr::DateCritical,
        ScalarAttr::DateRecovered,
        ScalarAttr::DateDead,
        ScalarAttr::DateQuarantined,
        ScalarAttr::DurExpToInf,
        ScalarAttr::DurInfToSym,
        ScalarAttr::DurSymToSev,
        ScalarAttr::DurDisease,
        ScalarAttr::Infections,
        ScalarAttr::PeakNab,
    ];

    /// Number of scalar attributes.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this attribute in [`ScalarAttr::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name for logging and error reporting.
    pub fn name(self) -> &'static str {
        match self {
            Self::Susceptible => "susceptible",
            Self::Exposed => "exposed",
            Self::Infectious => "infectious",
            Self::Symptomatic => "symptomatic",
            Self::Severe => "severe",
            Self::Critical => "critical",
            Self::Recovered => "recovered",
            Self::Dead => "dead",
            Self::DateExposed => "date_exposed",
            Self::DateInfectious => "date_infectious",
            Self::DateSymptomatic => "date_symptomatic",
            Self::DateSevere => "date_severe",
            Self::DateCritical => "date_critical",
            Self::DateRecovered => "date_recovered",
            Self::DateDead => "date_dead",
            Self::DateQuarantined => "date_quarantined",
            Self::DurExpToInf => "dur_exp2inf",
            Self::DurInfToSym => "dur_inf2sym",
            Self::DurSymToSev => "dur_sym2sev",
            Self::DurDisease => "dur_disease",
            Self::Infections => "n_infections",
            Self::PeakNab => "peak_nab",
        }
    }
}

/// Per-agent attributes carried separately for every disease variant.
///
/// Each variant identifies a family of `f64` buffers, one per disease
/// variant index, each of length `n_agents`. The synchronizer merges
/// each variant index independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariantAttr {
    /// Agent is exposed to this variant (flag).
    ExposedByVariant,
    /// Agent is infectious with this variant (flag).
    InfectiousByVariant,
    /// Immunity against infection by this variant.
    SusImm,
    /// Immunity against symptomatic disease from this variant.
    SympImm,
    /// Immunity against severe disease from this variant.
    SevImm,
}

impl VariantAttr {
    /// Every per-variant attribute, in synchronization order.
    pub const ALL: [VariantAttr; 5] = [
        VariantAttr::ExposedByVariant,
        VariantAttr::InfectiousByVariant,
        VariantAttr::SusImm,
        VariantAttr::SympImm,
        VariantAttr::SevImm,
    ];

    /// Number of per-variant attributes.
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this attribute in [`VariantAttr::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name for logging and error reporting.
    pub fn name(self) -> &'static str {
        match self {
            Self::ExposedByVariant => "exposed_by_variant",
            Self::InfectiousByVariant => "infectious_by_variant",
            Self::SusImm => "sus_imm",
            Self::SympImm => "symp_imm",
            Self::SevImm => "sev_imm",
        }
    }
}
