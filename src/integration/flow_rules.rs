/// Holds the value of a flow rule and its derivatives
///
/// For plastic flows `f` is the yield function; for creep flows it is the
/// equivalent strain rate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowEvaluation {
    /// Value of the flow
    pub f: f64,

    /// Derivative with respect to the equivalent stress
    pub df_dseq: f64,

    /// Derivative with respect to the equivalent strain (zero for creep flows)
    pub df_dp: f64,
}

impl FlowEvaluation {
    /// Returns true if all values are finite
    pub fn is_finite(&self) -> bool {
        self.f.is_finite() && self.df_dseq.is_finite() && self.df_dp.is_finite()
    }
}

/// Defines a flow rule evaluated at the equivalent stress `seq` and the equivalent strain `p`
///
/// Returning `None` means that the flow could not be evaluated.
pub trait FlowRule {
    fn evaluate(&self, seq: f64, p: f64) -> Option<FlowEvaluation>;
}

impl<F> FlowRule for F
where
    F: Fn(f64, f64) -> Option<FlowEvaluation>,
{
    fn evaluate(&self, seq: f64, p: f64) -> Option<FlowEvaluation> {
        self(seq, p)
    }
}

/// Implements the Norton creep law `f = A seqⁿ`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NortonFlow {
    pub a: f64,
    pub n: f64,
}

impl FlowRule for NortonFlow {
    fn evaluate(&self, seq: f64, _p: f64) -> Option<FlowEvaluation> {
        let f = self.a * f64::powf(seq, self.n);
        let df_dseq = self.n * self.a * f64::powf(seq, self.n - 1.0);
        Some(FlowEvaluation { f, df_dseq, df_dp: 0.0 })
    }
}

/// Implements a plastic flow with linear isotropic hardening `f = seq - R0 - H p`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearHardeningFlow {
    pub r0: f64,
    pub h: f64,
}

impl FlowRule for LinearHardeningFlow {
    fn evaluate(&self, seq: f64, p: f64) -> Option<FlowEvaluation> {
        Some(FlowEvaluation {
            f: seq - self.r0 - self.h * p,
            df_dseq: 1.0,
            df_dp: -self.h,
        })
    }
}

/// Implements a strain hardening creep law `f = A seqⁿ (1+p)⁻ᵐ`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrainHardeningNortonFlow {
    pub a: f64,
    pub n: f64,
    pub m: f64,
}

impl FlowRule for StrainHardeningNortonFlow {
    fn evaluate(&self, seq: f64, p: f64) -> Option<FlowEvaluation> {
        if p <= -1.0 {
            return None;
        }
        let h = f64::powf(1.0 + p, -self.m);
        let f = self.a * f64::powf(seq, self.n) * h;
        let df_dseq = self.n * self.a * f64::powf(seq, self.n - 1.0) * h;
        let df_dp = -self.m * f / (1.0 + p);
        Some(FlowEvaluation { f, df_dseq, df_dp })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{FlowEvaluation, FlowRule, LinearHardeningFlow, NortonFlow, StrainHardeningNortonFlow};
    use approx::assert_relative_eq;

    #[test]
    fn norton_works() {
        let norton = NortonFlow { a: 1e-10, n: 5.0 };
        let ev = norton.evaluate(100.0, 0.0).unwrap();
        assert_relative_eq!(ev.f, 1.0, epsilon = 1e-14);
        assert_relative_eq!(ev.df_dseq, 0.05, epsilon = 1e-15);
        assert_eq!(ev.df_dp, 0.0);
    }

    #[test]
    fn linear_hardening_works() {
        let flow = LinearHardeningFlow { r0: 200.0, h: 1000.0 };
        let ev = flow.evaluate(250.0, 0.01).unwrap();
        assert_eq!(ev, FlowEvaluation { f: 40.0, df_dseq: 1.0, df_dp: -1000.0 });
    }

    #[test]
    fn strain_hardening_works() {
        let flow = StrainHardeningNortonFlow { a: 2.0, n: 2.0, m: 1.0 };
        let ev = flow.evaluate(3.0, 1.0).unwrap();
        assert_relative_eq!(ev.f, 9.0, epsilon = 1e-14);
        assert_relative_eq!(ev.df_dseq, 6.0, epsilon = 1e-14);
        assert_relative_eq!(ev.df_dp, -4.5, epsilon = 1e-14);
        assert_eq!(flow.evaluate(3.0, -1.0), None);
    }

    #[test]
    fn closures_work() {
        let rule = |seq: f64, _p: f64| {
            Some(FlowEvaluation {
                f: seq,
                df_dseq: 1.0 / seq,
                df_dp: 0.0,
            })
        };
        assert!(rule.evaluate(2.0, 0.0).unwrap().is_finite());
        assert!(!rule.evaluate(0.0, 0.0).unwrap().is_finite());
    }
}
