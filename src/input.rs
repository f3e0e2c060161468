//! The Input port (§6.4): describes what the executor is waiting for
//! without blocking on it. Suspending on input rather than calling into a
//! blocking read is the central redesign point this crate makes over a
//! traditional direct-to-terminal interpreter.

/// What the executor needs from the host to resume after a `Suspend`.
#[derive(Debug, Clone, PartialEq)]
pub enum InputRequest {
    /// `sread`/`read` (V1-4 `sread`, V5+ `aread`): a full line of text.
    /// `text_buf`/`parse_buf` are where the result must be written before
    /// resuming; `time`/`routine` describe an optional timed-input
    /// interrupt (V4+; 0/0 means untimed).
    Line {
        text_buf: u32,
        parse_buf: u32,
        time: u16,
        routine: u16,
    },
    /// `read_char` (V4+): a single keystroke.
    Char { time: u16, routine: u16 },
}

/// What the host hands back to `Interpreter::deliver_input`.
#[derive(Debug, Clone, PartialEq)]
pub enum InputResponse {
    Line(String),
    Char(char),
    /// The timed-input routine fired and asked to terminate the read.
    TimedOut,
}

/// The Input port: tells a host backend (terminal, web socket, …) to
/// start or stop collecting a line/keystroke. The backend's own event
/// loop is what actually completes the request - on a finished line, a
/// keypress, or a timer firing, it calls `Interpreter::deliver_input`
/// with the matching `InputResponse` variant. The core never blocks
/// waiting on this trait; it only calls these methods to arm or disarm
/// the backend, then returns control to the host immediately.
pub trait InputProcessor {
    fn start_line_input(&mut self, request: &InputRequest);
    fn start_char_input(&mut self, request: &InputRequest);
    fn cancel_input(&mut self);
}

/// An `InputProcessor` for hosts that drive `deliver_input` directly
/// (scripts, tests) without a real backend event loop to arm.
pub struct NullInputProcessor;

impl InputProcessor for NullInputProcessor {
    fn start_line_input(&mut self, _request: &InputRequest) {}
    fn start_char_input(&mut self, _request: &InputRequest) {}
    fn cancel_input(&mut self) {}
}
