//! The `Interpreter` façade: the one object a host actually drives. Owns
//! the `GameState`-running `Executor`, the `Screen` (`ZMachineDisplay`)
//! and `InputProcessor` ports, and an optional `Storage` backend; turns
//! `StepResult`s into the small `start/resume/quit/restart` surface.

use crate::display_trait::ZMachineDisplay;
use crate::error::{ExecutionError, ZError};
use crate::executor::{Executor, StepResult};
use crate::input::{InputProcessor, InputRequest, InputResponse};
use crate::memory::Memory;
use crate::state::GameState;
use crate::storage::Storage;

/// What the host should do next.
pub enum RunResult {
    /// Waiting on `deliver_input` before it can continue.
    AwaitingInput(InputRequest),
    Quit,
}

pub struct Interpreter {
    executor: Executor,
    screen: Box<dyn ZMachineDisplay>,
    input: Box<dyn InputProcessor>,
    /// Set once a fatal error has escaped `step`; per the propagation
    /// policy, the façade refuses to run any further instructions after
    /// that point.
    poisoned: Option<ZError>,
}

impl Interpreter {
    pub fn new(
        memory: Memory,
        screen: Box<dyn ZMachineDisplay>,
        input: Box<dyn InputProcessor>,
    ) -> Self {
        let state = GameState::new(memory);
        Self::with_state(state, screen, input)
    }

    /// Build around an already-constructed `GameState`, e.g. one seeded
    /// with a predictable RNG via `GameState::with_rng`.
    pub fn with_state(
        state: GameState,
        screen: Box<dyn ZMachineDisplay>,
        input: Box<dyn InputProcessor>,
    ) -> Self {
        Interpreter {
            executor: Executor::new(state),
            screen,
            input,
            poisoned: None,
        }
    }

    pub fn with_storage(
        memory: Memory,
        screen: Box<dyn ZMachineDisplay>,
        input: Box<dyn InputProcessor>,
        storage: Box<dyn Storage>,
    ) -> Self {
        let state = GameState::new(memory);
        Self::with_state_and_storage(state, screen, input, storage)
    }

    pub fn with_state_and_storage(
        state: GameState,
        screen: Box<dyn ZMachineDisplay>,
        input: Box<dyn InputProcessor>,
        storage: Box<dyn Storage>,
    ) -> Self {
        Interpreter {
            executor: Executor::with_storage(state, storage),
            screen,
            input,
            poisoned: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.executor.state
    }

    /// Begin running: steps until the game suspends for input, quits, or
    /// errors.
    pub fn start(&mut self) -> Result<RunResult, ZError> {
        self.resume()
    }

    /// Resume after `deliver_input`, or just keep stepping if nothing was
    /// outstanding. Runs instructions until one of them needs the host.
    pub fn resume(&mut self) -> Result<RunResult, ZError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        loop {
            match self.executor.step(self.screen.as_mut()) {
                StepResult::Continue => continue,
                StepResult::Restarted => continue,
                StepResult::Quit => return Ok(RunResult::Quit),
                StepResult::Suspend(request) => {
                    match &request {
                        InputRequest::Line { .. } => self.input.start_line_input(&request),
                        InputRequest::Char { .. } => self.input.start_char_input(&request),
                    }
                    return Ok(RunResult::AwaitingInput(request));
                }
                StepResult::Error(e) => {
                    log::error!("interpreter poisoned by fatal error: {e}");
                    let err = ZError::Execution(e);
                    self.poisoned = Some(err.clone());
                    return Err(err);
                }
            }
        }
    }

    /// Hand the host's collected input back to the suspended opcode and
    /// keep running.
    pub fn deliver_input(&mut self, response: InputResponse) -> Result<RunResult, ZError> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        let pc = self.executor.state.pc;
        if let Err(message) = self.executor.deliver_input(response) {
            log::error!("fatal error delivering input at {pc:#06x}: {message}");
            let err = ZError::Execution(ExecutionError::new(pc, message));
            self.poisoned = Some(err.clone());
            return Err(err);
        }
        self.resume()
    }

    /// Whether the façade is currently waiting on input.
    pub fn is_awaiting_input(&self) -> bool {
        self.executor.is_awaiting_input()
    }

    pub fn quit(&mut self) {
        self.input.cancel_input();
    }

    pub fn restart(&mut self) {
        self.input.cancel_input();
        self.executor.state.restart();
        self.poisoned = None;
    }
}
