//! Javelin — a small stack-based bytecode interpreter.
//!
//! Runs one of the built-in demonstration programs and prints every
//! value the program reports, one per line, in call order.

mod fixtures;

use std::process::ExitCode;
use std::sync::Arc;

use javelin_bytecode::Program;

const EXIT_RUNTIME_ERROR: u8 = 1;
const EXIT_USAGE_ERROR: u8 = 2;

fn help_text() -> &'static str {
    "usage: javelin <program> [args]\n\
     \n\
     programs:\n\
    \x20 control        arithmetic, branches, arrays, calls, try/catch/finally\n\
    \x20 fib [count]    wrapping Fibonacci accumulation (default 1000000000)\n\
     \n\
     options:\n\
    \x20 -h, --help     print this help\n\
    \x20 --disassemble  print the program's bytecode instead of running it"
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut disassemble = false;
    let mut positional: Vec<&str> = Vec::new();
    for arg in &args {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return ExitCode::SUCCESS;
            }
            "--disassemble" => disassemble = true,
            other if other.starts_with('-') => {
                eprintln!("javelin: unknown option '{}'", other);
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
            other => positional.push(other),
        }
    }

    let program = match build_program(&positional) {
        Ok(program) => program,
        Err(message) => {
            eprintln!("javelin: {}", message);
            eprintln!("{}", help_text());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    if disassemble {
        for method in program.methods.iter() {
            println!("{}", method);
        }
        return ExitCode::SUCCESS;
    }

    let report = Box::new(|value: i32| println!("{}", value));
    match javelin_vm::run(Arc::new(program), report) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("javelin: {}", err);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn build_program(positional: &[&str]) -> Result<Program, String> {
    match positional {
        ["control"] => Ok(fixtures::control_flow_program()),
        ["fib"] => Ok(fixtures::fibonacci_program(fixtures::DEFAULT_FIB_TIMES)),
        ["fib", raw] => raw
            .parse()
            .map(fixtures::fibonacci_program)
            .map_err(|_| format!("invalid iteration count '{}'", raw)),
        [] => Err("missing program name".to_string()),
        [name, ..] => Err(format!("unknown program '{}'", name)),
    }
}
