use crate::diagnostics::RuntimeError;
use crate::env::Environment;
use crate::eval;
use crate::parser;
use crate::value::Value;

/// Parses and evaluates a program that must succeed end to end.
fn run(input: &str) -> Value {
    try_run(input).unwrap_or_else(|err| panic!("runtime fault for {input:?}: {err}"))
}

fn try_run(input: &str) -> Result<Value, RuntimeError> {
    let report = parser::parse_program(input);
    assert!(
        report.errors.is_empty(),
        "unexpected parse errors for {input:?}: {:?}",
        report.errors
    );
    eval::eval_block(&report.program, &Environment::new())
}

fn run_fault(input: &str) -> RuntimeError {
    match try_run(input) {
        Ok(value) => panic!("expected a fault for {input:?}, got {value:?}"),
        Err(err) => err,
    }
}

fn assert_integer(value: &Value, expected: i64) {
    match value {
        Value::Integer(i) => assert_eq!(*i, expected),
        other => panic!("expected INTEGER {expected}, got {other:?}"),
    }
}

fn assert_boolean(value: &Value, expected: bool) {
    match value {
        Value::Boolean(b) => assert_eq!(*b, expected),
        other => panic!("expected BOOLEAN {expected}, got {other:?}"),
    }
}

#[test]
fn integer_arithmetic() {
    let cases = [
        ("5", 5),
        ("-5", -5),
        ("5 + 5 + 5 + 5 - 10", 10),
        ("2 * 2 * 2 * 2 * 2", 32),
        ("2 * (5 + 10)", 30),
        ("3 * 3 * 3 + 10", 37),
        ("50 / 2 * 2 + 10", 60),
        ("7 % 3", 1),
        ("7 & 3", 3),
        ("7 | 8", 15),
        ("7 ^ 5", 2),
        ("-(5 + 5)", -10),
    ];
    for (input, expected) in cases {
        assert_integer(&run(input), expected);
    }
}

#[test]
fn comparisons() {
    let cases = [
        ("true", true),
        ("false", false),
        ("1 < 2", true),
        ("1 > 2", false),
        ("1 <= 1", true),
        ("2 >= 3", false),
        ("1 == 1", true),
        ("1 != 2", true),
        ("true == true", true),
        ("(1 < 2) == true", true),
        ("\"a\" == \"a\"", true),
        ("[1, 2] == [1, 2]", true),
        ("[1, 2] == [2, 1]", false),
    ];
    for (input, expected) in cases {
        assert_boolean(&run(input), expected);
    }
}

#[test]
fn bang_follows_truthiness() {
    let cases = [
        ("!true", false),
        ("!!true", true),
        ("!5", false),
        ("!0", true),
        ("!\"\"", true),
        ("!\"x\"", false),
        ("![]", true),
        ("!{}", true),
    ];
    for (input, expected) in cases {
        assert_boolean(&run(input), expected);
    }
}

#[test]
fn logic_operators_are_eager() {
    assert_boolean(&run("1 && 2"), true);
    assert_boolean(&run("0 || \"\""), false);
    assert_boolean(&run("false || 5"), true);
    // Both sides evaluate even when the left already decides the outcome.
    assert_integer(&run("let hit = 0\nfalse && (hit = 1)\nhit"), 1);
}

#[test]
fn division_by_zero_is_fatal() {
    assert!(matches!(
        run_fault("5 / 0"),
        RuntimeError::DivisionByZero { .. }
    ));
    assert!(matches!(
        run_fault("5 % 0"),
        RuntimeError::DivisionByZero { .. }
    ));
}

#[test]
fn equality_requires_matching_kinds() {
    match run("1 == \"1\"") {
        Value::Error(message) => assert!(
            message.contains("no such operator `==` between INTEGER and STRING"),
            "{message}"
        ),
        other => panic!("expected an error value, got {other:?}"),
    }
    assert!(matches!(run("[1] != 1"), Value::Error(_)));
    assert!(matches!(run("true == 1"), Value::Error(_)));
    assert!(matches!(run("\"a\" == true"), Value::Error(_)));
}

#[test]
fn negation_wraps_at_the_integer_boundary() {
    assert_integer(&run("-(-5)"), 5);
    let input = "let x = 0 - 9223372036854775807 - 1\n-x";
    assert_integer(&run(input), i64::MIN);
}

#[test]
fn type_mismatches_are_in_band_errors() {
    match run("\"a\" + 1") {
        Value::Error(message) => {
            assert!(message.contains("no such operator `+`"), "{message}");
        }
        other => panic!("expected an error value, got {other:?}"),
    }
    assert!(matches!(run("-true"), Value::Error(_)));
    // An error value halts the rest of the program in-band.
    assert!(matches!(run("\"a\" + 1\n99"), Value::Error(_)));
}

#[test]
fn let_bindings_and_lookup() {
    assert_integer(&run("let a = 5\na"), 5);
    assert_integer(&run("let a = 5\nlet b = a\nb"), 5);
    assert_integer(&run("let a = 5\nlet b = a + 5\na + b"), 15);
}

#[test]
fn name_faults() {
    assert!(matches!(
        run_fault("missing"),
        RuntimeError::UndefinedName { .. }
    ));
    assert!(matches!(
        run_fault("missing = 5"),
        RuntimeError::UndefinedName { .. }
    ));
    assert!(matches!(
        run_fault("let a = 1\nlet a = 2"),
        RuntimeError::Redeclaration { .. }
    ));
}

#[test]
fn shadowing_in_an_inner_frame_is_legal() {
    let input = "let a = 1\nlet f = () => { let a = 2\na }\nf() + a";
    assert_integer(&run(input), 3);
}

#[test]
fn assignment_walks_the_frame_chain() {
    let input = "let a = 1\nlet f = () => { a = 5 }\nf()\na";
    assert_integer(&run(input), 5);
}

#[test]
fn function_calls() {
    assert_integer(&run("let f = (a, b) => { a + b }\nf(2, 3)"), 5);
    assert_integer(&run("let double = (x) => { x * 2 }\ndouble(5)"), 10);
    assert_integer(&run("let f = (x) => { x }\nf(f(9))"), 9);
    // The body yields its last statement unless a return cuts it short.
    assert_integer(&run("let f = (x) => { return x * 2\nx }\nf(5)"), 10);
}

#[test]
fn closures_capture_their_defining_frame() {
    let input = "let adder = (x) => { (y) => { x + y } }\nlet add2 = adder(2)\nadd2(3)";
    assert_integer(&run(input), 5);
}

#[test]
fn call_faults() {
    assert!(matches!(
        run_fault("let f = (a) => { a }\nf(1, 2)"),
        RuntimeError::Arity {
            expected: 1,
            got: 2,
            ..
        }
    ));
    assert!(matches!(
        run_fault("let x = 5\nx(1)"),
        RuntimeError::NotCallable { kind: "INTEGER", .. }
    ));
}

#[test]
fn return_propagates_through_conditionals() {
    let input = "let f = (x) => { if (x) { return 1 }\n2 }\nf(true)";
    assert_integer(&run(input), 1);
    let input = "let f = (x) => { if (x) { return 1 }\n2 }\nf(false)";
    assert_integer(&run(input), 2);
}

#[test]
fn list_reads_and_writes() {
    assert_integer(&run("let a = [1, 2, 3]\na[1]"), 2);
    assert_integer(&run("let a = [1, 2, 3]\na[0] = 9\na[0]"), 9);
    assert_integer(&run("len([1] + [2, 3])"), 3);
    // Out-of-range reads are forgiving, writes are not.
    assert!(matches!(run("[1, 2][5]"), Value::Option(None)));
    assert!(matches!(run("[1, 2][-1]"), Value::Option(None)));
    assert!(matches!(
        run_fault("let a = [1]\na[3] = 0"),
        RuntimeError::IndexOutOfRange {
            index: 3,
            len: 1,
            ..
        }
    ));
}

#[test]
fn string_indexing() {
    match run("\"hello\"[1]") {
        Value::Str(s) => assert_eq!(s, "e"),
        other => panic!("expected STRING, got {other:?}"),
    }
    match run("\"hi\"[5]") {
        Value::Str(s) => assert_eq!(s, ""),
        other => panic!("expected STRING, got {other:?}"),
    }
}

#[test]
fn maps_key_structurally() {
    match run("let m = {[1, 2]: \"x\"}\nm[[1, 2]]") {
        Value::Str(s) => assert_eq!(s, "x"),
        other => panic!("expected STRING, got {other:?}"),
    }
    assert!(matches!(run("let m = {\"a\": 1}\nm[\"b\"]"), Value::Option(None)));
    assert_integer(&run("let m = {\"a\": 1}\nm[\"a\"] = 2\nm[\"a\"]"), 2);
    assert_integer(&run("let m = {}\nm[[1]] = 7\nm[[1]]"), 7);
}

#[test]
fn unhashable_keys_fault() {
    assert!(matches!(
        run_fault("let f = () => { 1 }\nlet m = {}\nm[f] = 1"),
        RuntimeError::UnhashableKey { kind: "FUNCTION" }
    ));
}

#[test]
fn indexing_with_a_callable_is_a_fault() {
    let fault = run_fault("let f = (e, i) => { e }\n[1, 2][f]");
    assert!(matches!(fault, RuntimeError::InvalidArgument { .. }));
    assert!(fault.to_string().contains("each"), "{fault}");
}

#[test]
fn structural_hashing() {
    assert_boolean(&run("hash([1, 2]) == hash([1, 2])"), true);
    assert_boolean(&run("hash([1, 2]) == hash([2, 1])"), false);
    assert_boolean(&run("hash(1) == hash(true)"), false);
    assert_boolean(
        &run("hash({\"a\": 1, \"b\": 2}) == hash({\"b\": 2, \"a\": 1})"),
        true,
    );
    assert_boolean(&run("hash(range(0, 3)) == hash(range(3, 0))"), false);
}

#[test]
fn conditionals_yield_options() {
    assert_eq!(run("if (true) { 5 }").inspect(), "?(5)");
    assert_eq!(run("if (false) { 1 } else { 2 }").inspect(), "?(2)");
    assert_eq!(run("if (false) { 1 }").inspect(), "?()");
    // A taken empty arm still wraps: the block's absent option, populated.
    assert_eq!(run("if (true) { }").inspect(), "?(?())");
    assert_eq!(
        run("if (0) { 1 } else if (\"x\") { 2 } else { 3 }").inspect(),
        "?(2)"
    );
}

#[test]
fn option_names() {
    assert_eq!(run("let x?\nx").inspect(), "?()");
    assert_eq!(run("let x? = 5\nx").inspect(), "?(5)");
    // A value that is already an option is not wrapped twice.
    assert_eq!(run("let x? = if (true) { 5 }\nx").inspect(), "?(5)");
    assert_integer(&run("let x?\nlen(x)"), 0);
    assert_integer(&run("let x? = 5\nlen(x)"), 1);
}

#[test]
fn len_and_aliases() {
    assert_integer(&run("len(\"hello\")"), 5);
    assert_integer(&run("size([1, 2, 3])"), 3);
    assert_integer(&run("count({\"a\": 1, \"b\": 2})"), 2);
    assert!(matches!(
        run_fault("len(5)"),
        RuntimeError::InvalidArgument { .. }
    ));
    assert!(matches!(
        run_fault("len()"),
        RuntimeError::InvalidArgument { .. }
    ));
}

#[test]
fn builtins_resolve_before_user_bindings() {
    // Declaring the name succeeds, but lookups still find the builtin.
    assert_integer(&run("let len = 5\nlen(\"abc\")"), 3);
}

#[test]
fn print_returns_what_it_wrote() {
    match run("print(\"a\", 1, [2])") {
        Value::Str(s) => assert_eq!(s, "a 1 [2]"),
        other => panic!("expected STRING, got {other:?}"),
    }
    // Strings render unquoted, options transparently.
    match run("print(if (true) { \"inner\" })") {
        Value::Str(s) => assert_eq!(s, "inner"),
        other => panic!("expected STRING, got {other:?}"),
    }
}

#[test]
fn ranges() {
    assert_integer(&run("len(range(0, 5))"), 5);
    assert_integer(&run("len(range(5, 0))"), 5);
    assert_integer(&run("len(range(2, 2))"), 0);
    assert_eq!(run("range(0, 3)").inspect(), "0..3");
    // Extreme bounds must not trip the subtraction in the length.
    assert!(matches!(
        run("len(range(-9223372036854775807, 9223372036854775807))"),
        Value::Integer(_)
    ));
    assert!(matches!(
        run_fault("range(0, \"x\")"),
        RuntimeError::InvalidArgument { .. }
    ));
}

#[test]
fn each_iterates_and_returns_the_iterable() {
    let input = "let total = 0\neach([1, 2, 3], (e, i) => { total = total + e })\ntotal";
    assert_integer(&run(input), 6);
    let input = "let idxs = 0\neach(\"abc\", (ch, i) => { idxs = idxs + i })\nidxs";
    assert_integer(&run(input), 3);
    assert_integer(&run("len(each([1, 2], (e, i) => { e }))"), 2);
}

#[test]
fn map_collects_results() {
    assert_eq!(
        run("map([1, 2, 3], (e, i) => { e * 10 })").inspect(),
        "[10, 20, 30]"
    );
    assert_eq!(run("map(range(3, 0), (n, i) => { n })").inspect(), "[3, 2, 1]");
    assert_eq!(run("map([10], (e, i) => { i })").inspect(), "[0]");
    // Map iteration passes key, value and index.
    assert_integer(&run("len(map({\"a\": 1}, (k, v, i) => { v }))"), 1);
}

#[test]
fn iteration_arity_mismatch_faults() {
    assert!(matches!(
        run_fault("each([1], (e) => { e })"),
        RuntimeError::Arity { .. }
    ));
}

#[test]
fn top_level_return_signals() {
    match run("return 5\n99") {
        Value::ReturnSignal(inner) => assert_integer(&inner, 5),
        other => panic!("expected a return signal, got {other:?}"),
    }
}

#[test]
fn truthiness_drives_conditions() {
    let cases = [
        ("if (1) { \"t\" } else { \"f\" }", "?(\"t\")"),
        ("if (0) { \"t\" } else { \"f\" }", "?(\"f\")"),
        ("if (\"\") { \"t\" } else { \"f\" }", "?(\"f\")"),
        ("if ([1]) { \"t\" } else { \"f\" }", "?(\"t\")"),
        ("if ({}) { \"t\" } else { \"f\" }", "?(\"f\")"),
        ("let x?\nif (x) { \"t\" } else { \"f\" }", "?(\"f\")"),
        ("let x? = 0\nif (x) { \"t\" } else { \"f\" }", "?(\"t\")"),
    ];
    for (input, expected) in cases {
        assert_eq!(run(input).inspect(), expected, "input: {input:?}");
    }
}
