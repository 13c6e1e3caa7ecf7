use crate::types::Fragment;

/// Outcome of one [`Agent::generate`](super::Agent::generate) call.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// The final reply carried no tool calls.
    Completed(Fragment),
    /// The tool loop hit `max_tool_rounds`; the fragment ends with the
    /// unanswered tool-call request.
    ToolLoopExhausted(Fragment),
    /// The termination policy vetoed generation.
    Terminated,
    /// The provider produced no usable candidate.
    NoReply,
}

impl AgentReply {
    /// The generated fragment, if any. An exhausted tool loop still yields
    /// its fragment.
    pub fn into_fragment(self) -> Option<Fragment> {
        match self {
            Self::Completed(fragment) | Self::ToolLoopExhausted(fragment) => Some(fragment),
            Self::Terminated | Self::NoReply => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}
