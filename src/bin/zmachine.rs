//! CLI entry point: loads a story file, wires up a `Screen`/`InputProcessor`
//! pair (terminal or headless), and drives the `Interpreter` façade's
//! suspend/resume loop against real stdin.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use zmachine_core::config::{Config, DisplayBackend};
use zmachine_core::display_headless::HeadlessDisplay;
use zmachine_core::display_terminal::TerminalDisplay;
use zmachine_core::display_trait::ZMachineDisplay;
use zmachine_core::input::{InputProcessor, InputResponse, NullInputProcessor};
use zmachine_core::input_terminal::TerminalInputProcessor;
use zmachine_core::interpreter::{Interpreter, RunResult};
use zmachine_core::memory::Memory;
use zmachine_core::state::GameState;
use zmachine_core::storage::FileStorage;
use zmachine_core::zrand::ZRand;

struct Args {
    story_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    headless: bool,
    seed: Option<u64>,
    save_path: PathBuf,
}

fn parse_args() -> Result<Args, String> {
    let mut story_path = None;
    let mut config_path = None;
    let mut headless = false;
    let mut seed = None;
    let mut save_path = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = Some(PathBuf::from(args.next().ok_or("--config needs a path")?));
            }
            "--headless" => headless = true,
            "--seed" => {
                let value = args.next().ok_or("--seed needs a number")?;
                seed = Some(value.parse::<u64>().map_err(|e| format!("invalid --seed: {e}"))?);
            }
            "--save" => {
                save_path = Some(PathBuf::from(args.next().ok_or("--save needs a path")?));
            }
            other if !other.starts_with('-') => story_path = Some(PathBuf::from(other)),
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    let save_path = save_path.unwrap_or_else(|| PathBuf::from("zmachine.qzl"));
    Ok(Args { story_path, config_path, headless, seed, save_path })
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("usage: zmachine [--config PATH] [--headless] [--seed N] [--save PATH] STORY");
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.config_path {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(message) => {
                eprintln!("{message}");
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    let story_path = match args.story_path.or_else(|| config.story_path.clone().map(PathBuf::from)) {
        Some(path) => path,
        None => {
            eprintln!("no story file given and none configured");
            return ExitCode::FAILURE;
        }
    };

    let raw = match fs::read(&story_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("failed to read {}: {e}", story_path.display());
            return ExitCode::FAILURE;
        }
    };
    let memory = match Memory::load(raw) {
        Ok(memory) => memory,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let rng = match args.seed.or(config.rng.predictable.then_some(config.rng.seed)) {
        Some(seed) => ZRand::new_predictable(seed),
        None => ZRand::new_uniform(),
    };
    let state = GameState::with_rng(memory, rng);

    // The façade's own `InputProcessor` only gets the "arm a pending read"
    // notification (`start_line_input`/`start_char_input`); the actual
    // blocking read in this synchronous CLI host happens in `drive_terminal`
    // against a second, locally-owned `TerminalInputProcessor`, since the
    // façade hands back its input port as a trait object with no way to
    // read a concrete response out of it.
    let use_headless = args.headless || config.display == DisplayBackend::Headless;
    let (screen, input): (Box<dyn ZMachineDisplay>, Box<dyn InputProcessor>) = if use_headless {
        (Box::new(HeadlessDisplay::new().unwrap()), Box::new(NullInputProcessor))
    } else {
        match TerminalDisplay::new() {
            Ok(display) => (Box::new(display), Box::new(NullInputProcessor) as Box<dyn InputProcessor>),
            Err(e) => {
                eprintln!("failed to start terminal display: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let storage = Box::new(FileStorage::new(args.save_path.clone()));
    let mut interpreter = Interpreter::with_state_and_storage(state, screen, input, storage);

    match run(&mut interpreter, use_headless) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Drive `start`/`resume`/`deliver_input` to completion.
fn run(interpreter: &mut Interpreter, headless: bool) -> Result<(), String> {
    if headless {
        return drive_headless(interpreter);
    }
    drive_terminal(interpreter)
}

fn drive_headless(interpreter: &mut Interpreter) -> Result<(), String> {
    let mut result = interpreter.start().map_err(|e| e.to_string())?;
    loop {
        match result {
            RunResult::Quit => return Ok(()),
            RunResult::AwaitingInput(_) => {
                // No stdin to read in headless mode; treat every read as a
                // clean EOF so scripted runs terminate rather than hang.
                result = interpreter
                    .deliver_input(InputResponse::TimedOut)
                    .map_err(|e| e.to_string())?;
            }
        }
    }
}

fn drive_terminal(interpreter: &mut Interpreter) -> Result<(), String> {
    let mut terminal_input = TerminalInputProcessor::new();
    let mut result = interpreter.start().map_err(|e| e.to_string())?;
    loop {
        match result {
            RunResult::Quit => return Ok(()),
            RunResult::AwaitingInput(request) => {
                match &request {
                    zmachine_core::input::InputRequest::Line { .. } => terminal_input.start_line_input(&request),
                    zmachine_core::input::InputRequest::Char { .. } => terminal_input.start_char_input(&request),
                }
                let response = terminal_input.read_response()?;
                result = interpreter.deliver_input(response).map_err(|e| e.to_string())?;
            }
        }
    }
}
