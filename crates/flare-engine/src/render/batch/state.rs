use crate::render::error::RenderError;

/// Lifecycle of a [`BatchRenderer`](super::BatchRenderer).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BatchState {
    #[default]
    Idle,
    Drawing,
    /// Terminal; GPU resources have been released.
    Disposed,
}

/// Operations that are subject to a state check.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BatchOp {
    Begin,
    Draw,
    End,
    Flush,
    Dispose,
}

impl BatchState {
    /// Returns the state after `op`, or the violation if `op` is not allowed here.
    ///
    /// This is the complete transition table; nothing else mutates the state.
    pub fn transition(self, op: BatchOp) -> Result<BatchState, RenderError> {
        use BatchOp::*;
        use BatchState::*;

        match (self, op) {
            (Idle, Begin) => Ok(Drawing),
            (Drawing, Begin) => Err(RenderError::IllegalState("double begin")),

            (Drawing, Draw) => Ok(Drawing),
            (Idle, Draw) => Err(RenderError::IllegalState("draw before begin")),

            (Drawing, End) => Ok(Idle),
            (Idle, End) => Err(RenderError::IllegalState("end before begin")),

            (Idle | Drawing, Flush) => Ok(self),

            (Idle | Disposed, Dispose) => Ok(Disposed),
            (Drawing, Dispose) => Err(RenderError::IllegalState("dispose while drawing")),

            (Disposed, Begin | Draw | End | Flush) => Err(RenderError::IllegalState("renderer disposed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(state: BatchState, op: BatchOp) -> &'static str {
        match state.transition(op) {
            Err(RenderError::IllegalState(msg)) => msg,
            other => panic!("expected IllegalState for {op:?} in {state:?}, got {other:?}"),
        }
    }

    #[test]
    fn legal_transitions() {
        assert_eq!(BatchState::Idle.transition(BatchOp::Begin).unwrap(), BatchState::Drawing);
        assert_eq!(BatchState::Drawing.transition(BatchOp::Draw).unwrap(), BatchState::Drawing);
        assert_eq!(BatchState::Drawing.transition(BatchOp::Flush).unwrap(), BatchState::Drawing);
        assert_eq!(BatchState::Idle.transition(BatchOp::Flush).unwrap(), BatchState::Idle);
        assert_eq!(BatchState::Drawing.transition(BatchOp::End).unwrap(), BatchState::Idle);
        assert_eq!(BatchState::Idle.transition(BatchOp::Dispose).unwrap(), BatchState::Disposed);
        assert_eq!(BatchState::Disposed.transition(BatchOp::Dispose).unwrap(), BatchState::Disposed);
    }

    #[test]
    fn violations_name_the_misuse() {
        assert_eq!(message(BatchState::Drawing, BatchOp::Begin), "double begin");
        assert_eq!(message(BatchState::Idle, BatchOp::Draw), "draw before begin");
        assert_eq!(message(BatchState::Idle, BatchOp::End), "end before begin");
        assert_eq!(message(BatchState::Drawing, BatchOp::Dispose), "dispose while drawing");
    }

    #[test]
    fn disposed_is_terminal() {
        for op in [BatchOp::Begin, BatchOp::Draw, BatchOp::End, BatchOp::Flush] {
            assert_eq!(message(BatchState::Disposed, op), "renderer disposed");
        }
    }
}
