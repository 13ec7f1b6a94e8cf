use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use minilisp::environment::Environment;
use minilisp::evaluator::{EvalResult, evaluate_source, lispify};

// The demo owns no interpretation logic: it builds a default environment,
// triggers the two library imports, and prints rendered results.
fn run(env: &Rc<RefCell<Environment>>) -> EvalResult<()> {
    evaluate_source("(import lib/stdlib)", env.clone())?;
    evaluate_source("(import lib/merge-sort)", env.clone())?;

    for input in [
        "(sqrt 9)",
        "(count 1 '(1 0 9 1 8 71 8.1))",
        "(define array '(1 -8 5 19 7 3 4 9))",
        "(merge-sort array)",
    ] {
        let value = evaluate_source(input, env.clone())?;
        println!("{}", lispify(&value)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let env = Environment::new_default();
    match run(&env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
