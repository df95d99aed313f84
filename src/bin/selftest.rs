//! Conductor self-test binary
//!
//! A small suite served over stdin/stdout, used to exercise `conductor run` end to end.
//! `SELFTEST_MODE` picks the suite shape: `pass` (default), `mixed`, `noisy`, `skip`, `only` or `empty`.

use conductor::Outcome;
use conductor::Suite;

fn arithmetic(suite: &mut Suite) {
    suite
        .test("adds", || vec![Outcome::Pass])
        .test("multiplies", || {
            let product = 6 * 7;
            if product == 42 {
                vec![Outcome::Pass]
            } else {
                vec![Outcome::fail(format!("expected 42, got {product}"))]
            }
        });
}

fn build(mode: &str) -> Suite {
    let mut suite = Suite::new();
    match mode {
        "mixed" => {
            suite
                .describe("arithmetic", arithmetic)
                .test("compares strings", || {
                    vec![Outcome::fail_given("expected \"abc\" to equal \"abd\"", "abc")]
                })
                .test("divides", || {
                    let divisor = std::hint::black_box(0u32);
                    vec![if 10u32.checked_div(divisor).is_some() {
                        Outcome::Pass
                    } else {
                        panic!("attempt to divide by zero")
                    }]
                })
                .todo("parses negative numbers");
        }
        "noisy" => {
            suite
                .test("prints a line", || {
                    println!("debug: value is 3");
                    vec![Outcome::Pass]
                })
                .test("prints without a newline", || {
                    print!("progress: 50%");
                    vec![Outcome::Pass]
                })
                .describe("arithmetic", arithmetic);
        }
        "skip" => {
            suite
                .describe("arithmetic", arithmetic)
                .skip("slow", || vec![Outcome::Pass]);
        }
        "only" => {
            suite
                .describe("arithmetic", arithmetic)
                .only("focused", || vec![Outcome::Pass]);
        }
        "empty" => {}
        _ => {
            suite.describe("arithmetic", arithmetic);
        }
    }
    suite
}

fn main() {
    let mode = std::env::var("SELFTEST_MODE").unwrap_or_default();
    conductor::cli::run_suite(build(&mode));
}
