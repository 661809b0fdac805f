use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Defines the named slots receiving code blocks
///
/// Slots are emitted at fixed places of the behaviour class; several
/// contributors (DSL, bricks, user) may append to the same slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum CodeBlockSlot {
    BeforeInitializeLocalVariables,
    InitializeLocalVariables,
    AfterInitializeLocalVariables,
    FlowRule,
    Integrator,
    ComputeStress,
    ComputeFinalStress,
    AdditionalConvergenceChecks,
    UpdateAuxiliaryStateVariables,
    ComputePredictionOperator,
    ComputeTangentOperator,
    APrioriTimeStepScalingFactor,
    APosterioriTimeStepScalingFactor,
}

impl CodeBlockSlot {
    /// Returns the name of the slot
    pub fn name(&self) -> &'static str {
        match self {
            CodeBlockSlot::BeforeInitializeLocalVariables => "BeforeInitializeLocalVariables",
            CodeBlockSlot::InitializeLocalVariables => "InitializeLocalVariables",
            CodeBlockSlot::AfterInitializeLocalVariables => "AfterInitializeLocalVariables",
            CodeBlockSlot::FlowRule => "FlowRule",
            CodeBlockSlot::Integrator => "Integrator",
            CodeBlockSlot::ComputeStress => "ComputeStress",
            CodeBlockSlot::ComputeFinalStress => "ComputeFinalStress",
            CodeBlockSlot::AdditionalConvergenceChecks => "AdditionalConvergenceChecks",
            CodeBlockSlot::UpdateAuxiliaryStateVariables => "UpdateAuxiliaryStateVariables",
            CodeBlockSlot::ComputePredictionOperator => "ComputePredictionOperator",
            CodeBlockSlot::ComputeTangentOperator => "ComputeTangentOperator",
            CodeBlockSlot::APrioriTimeStepScalingFactor => "APrioriTimeStepScalingFactor",
            CodeBlockSlot::APosterioriTimeStepScalingFactor => "APosterioriTimeStepScalingFactor",
        }
    }
}

/// Defines where new code is inserted in an existing block
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Position {
    AtBeginning,
    AtEnd,
}

/// Defines how a new block interacts with an existing one
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Mode {
    /// Creates the block or appends to it
    CreateOrAppend,

    /// Creates the block; fails if it exists
    Create,

    /// Replaces any existing block
    Replace,

    /// Creates the block unless it exists
    CreateButDontReplace,
}

/// Holds a fragment of generated code
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CodeBlock {
    /// Source text
    pub code: String,

    /// Behaviour members used by the code
    pub members: BTreeSet<String>,
}

impl CodeBlock {
    /// Allocates a new instance
    pub fn new(code: &str) -> Self {
        CodeBlock {
            code: code.to_string(),
            members: BTreeSet::new(),
        }
    }

    /// Allocates a new instance using the given members
    pub fn with_members(code: &str, members: &[&str]) -> Self {
        CodeBlock {
            code: code.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Merges another block at the given position
    pub fn merge(&mut self, other: &CodeBlock, position: Position) {
        let other_code = with_trailing_newline(&other.code);
        let code = with_trailing_newline(&self.code);
        self.code = match position {
            Position::AtBeginning => format!("{}{}", other_code, code),
            Position::AtEnd => format!("{}{}", code, other_code),
        };
        self.members.extend(other.members.iter().cloned());
    }

    /// Returns true if there is no code
    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }
}

fn with_trailing_newline(code: &str) -> String {
    if code.is_empty() || code.ends_with('\n') {
        code.to_string()
    } else {
        format!("{}\n", code)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
