use super::*;
use std::sync::Mutex;

fn add_ints() -> Handle {
    Handle::native(vec![Type::Int, Type::Int], Type::Int, |args: &[Value]| {
        Ok(Value::Int(args[0].expect_int()? + args[1].expect_int()?))
    })
    .expect("add")
}

fn int_less_than(limit: i32) -> Handle {
    Handle::native(vec![Type::Int], Type::Bool, move |args: &[Value]| {
        Ok(Value::Bool(args[0].expect_int()? < limit))
    })
    .expect("less than")
}

fn increment() -> Handle {
    Handle::native(vec![Type::Int], Type::Int, |args: &[Value]| {
        Ok(Value::Int(args[0].expect_int()? + 1))
    })
    .expect("increment")
}

fn failing(ret: Type, exception: Exception) -> Handle {
    Handle::native(Vec::new(), ret, move |_: &[Value]| Err(exception.clone().into()))
        .expect("failing")
}

#[test]
fn native_rejects_void_parameters() {
    let err = Handle::native(vec![Type::Int, Type::Void], Type::Int, |_: &[Value]| {
        Ok(Value::Int(0))
    })
    .unwrap_err();
    assert!(matches!(err, ComposeError::SignatureMismatch { .. }));
}

#[test]
fn invoke_checks_argument_count_and_types() {
    let add = add_ints();
    let err = add.invoke(&[Value::Int(1)]).unwrap_err();
    assert_eq!(err.exception().class(), "WrongMethodTypeException");
    let err = add.invoke(&[Value::Int(1), Value::str("x")]).unwrap_err();
    assert_eq!(err.exception().class(), "WrongMethodTypeException");
    assert_eq!(add.invoke(&[Value::Int(2), Value::Int(3)]).unwrap().as_int(), Some(5));
}

#[test]
fn permute_duplicates_and_reorders() {
    let sub = Handle::native(vec![Type::Int, Type::Int], Type::Int, |args: &[Value]| {
        Ok(Value::Int(args[0].expect_int()? - args[1].expect_int()?))
    })
    .unwrap();
    let swapped = sub.permute(vec![Type::Int, Type::Int], vec![1, 0]).unwrap();
    assert_eq!(swapped.invoke(&[10.into(), 3.into()]).unwrap().as_int(), Some(-7));

    let doubled = add_ints().permute(vec![Type::Int], vec![0, 0]).unwrap();
    assert_eq!(doubled.invoke(&[21.into()]).unwrap().as_int(), Some(42));

    let err = add_ints()
        .permute(vec![Type::Str], vec![0, 0])
        .unwrap_err();
    assert!(matches!(err, ComposeError::SignatureMismatch { .. }));
}

#[test]
fn collect_replaces_or_inserts_arguments() {
    let composed = add_ints().collect(1, &increment()).unwrap();
    assert_eq!(composed.param_types(), &[Type::Int, Type::Int]);
    assert_eq!(composed.invoke(&[1.into(), 1.into()]).unwrap().as_int(), Some(3));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let record = Handle::native(vec![Type::Str], Type::Void, move |args: &[Value]| {
        log.lock().unwrap().push(args[0].to_string());
        Ok(Value::Unit)
    })
    .unwrap();
    let composed = increment().collect(0, &record).unwrap();
    assert_eq!(composed.param_types(), &[Type::Str, Type::Int]);
    let result = composed.invoke(&[Value::str("hi"), 4.into()]).unwrap();
    assert_eq!(result.as_int(), Some(5));
    assert_eq!(*seen.lock().unwrap(), vec!["hi".to_string()]);
}

#[test]
fn collect_rejects_mismatched_slot() {
    let to_str = Handle::native(vec![Type::Int], Type::Str, |args: &[Value]| {
        Ok(Value::str(args[0].to_string()))
    })
    .unwrap();
    let err = add_ints().collect(0, &to_str).unwrap_err();
    assert!(matches!(err, ComposeError::SignatureMismatch { .. }));
}

#[test]
fn drop_args_ignores_inserted_parameters() {
    let dropped = increment().drop_args(0, &[Type::Str, Type::Bool]).unwrap();
    assert_eq!(dropped.param_types(), &[Type::Str, Type::Bool, Type::Int]);
    let result = dropped
        .invoke(&[Value::str("x"), true.into(), 9.into()])
        .unwrap();
    assert_eq!(result.as_int(), Some(10));
}

#[test]
fn filter_return_post_processes() {
    let filtered = add_ints().filter_return(&increment()).unwrap();
    assert_eq!(filtered.invoke(&[1.into(), 2.into()]).unwrap().as_int(), Some(4));
    assert!(add_ints().filter_return(&add_ints()).is_err());
}

#[test]
fn convert_follows_conversion_table() {
    let long = increment().convert(&Type::Long).unwrap();
    assert_eq!(long.invoke(&[1.into()]).unwrap().as_long(), Some(2));

    let boxed = increment().convert(&Type::Any).unwrap();
    assert_eq!(boxed.return_type(), &Type::Any);
    let unboxed = boxed.convert(&Type::Int).unwrap();
    assert_eq!(unboxed.invoke(&[1.into()]).unwrap().as_int(), Some(2));

    let discarded = increment().convert(&Type::Void).unwrap();
    assert!(matches!(discarded.invoke(&[1.into()]).unwrap(), Value::Unit));

    assert!(increment().convert(&Type::Str).is_err());
    assert!(Handle::empty(vec![]).unwrap().convert(&Type::Int).is_err());
}

#[test]
fn downcast_failures_are_thrown() {
    let text = Handle::constant(Type::Any, Value::str("x"))
        .unwrap()
        .convert(&Type::Int)
        .unwrap();
    let err = text.invoke(&[]).unwrap_err();
    assert_eq!(err.exception().class(), "ClassCastException");

    let null = Handle::constant(Type::Any, Value::Null)
        .unwrap()
        .convert(&Type::Int)
        .unwrap();
    let err = null.invoke(&[]).unwrap_err();
    assert_eq!(err.exception().class(), "NullPointerException");
}

#[test]
fn guard_runs_only_selected_branch() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let branch = |name: &'static str| {
        let calls = calls.clone();
        Handle::native(vec![Type::Bool, Type::Int], Type::Int, move |args: &[Value]| {
            calls.lock().unwrap().push(name);
            args[1].expect_int().map(Value::Int)
        })
        .unwrap()
    };
    let guard = Handle::guard_with_test(
        &Handle::identity(Type::Bool).unwrap(),
        &branch("then"),
        &branch("else"),
    )
    .unwrap();
    guard.invoke(&[true.into(), 1.into()]).unwrap();
    guard.invoke(&[false.into(), 1.into()]).unwrap();
    assert_eq!(*calls.lock().unwrap(), vec!["then", "else"]);
}

#[test]
fn while_loop_may_skip_body() {
    let init = Handle::identity(Type::Int).unwrap();
    let pred = int_less_than(5).drop_args(1, &[Type::Int]).unwrap();
    let body = increment().drop_args(1, &[Type::Int]).unwrap();
    let looped = Handle::while_loop(&init, &pred, &body).unwrap();
    assert_eq!(looped.invoke(&[0.into()]).unwrap().as_int(), Some(5));
    assert_eq!(looped.invoke(&[9.into()]).unwrap().as_int(), Some(9));
}

#[test]
fn do_while_loop_runs_body_once() {
    let init = Handle::identity(Type::Int).unwrap();
    let pred = int_less_than(5).drop_args(1, &[Type::Int]).unwrap();
    let body = increment().drop_args(1, &[Type::Int]).unwrap();
    let looped = Handle::do_while_loop(&init, &body, &pred).unwrap();
    assert_eq!(looped.invoke(&[9.into()]).unwrap().as_int(), Some(10));
}

#[test]
fn loops_reject_void_state() {
    let init = Handle::empty(vec![]).unwrap();
    let pred = Handle::constant(Type::Bool, false.into()).unwrap();
    let err = Handle::while_loop(&init, &pred, &init).unwrap_err();
    assert!(matches!(err, ComposeError::ProtocolViolation { .. }));
}

#[test]
fn counted_loop_is_half_open() {
    let start = Handle::constant(Type::Int, 3.into()).unwrap();
    let end = Handle::constant(Type::Int, 7.into()).unwrap();
    let init = Handle::constant(Type::Str, Value::str("")).unwrap();
    let body = Handle::native(vec![Type::Str, Type::Int], Type::Str, |args: &[Value]| {
        Ok(Value::str(format!("{}{} ", args[0], args[1])))
    })
    .unwrap();
    let looped = Handle::counted_loop(&start, &end, &init, &body).unwrap();
    assert_eq!(looped.invoke(&[]).unwrap().to_string(), "3 4 5 6 ");
}

#[test]
fn iterated_loop_drains_source() {
    let source = Handle::native(vec![], Type::iterator(Type::Int), |_: &[Value]| {
        Ok(Value::Iterator(crate::value::IteratorValue::new(
            (1..=4).map(Value::Int),
        )))
    })
    .unwrap();
    let init = Handle::constant(Type::Int, 0.into()).unwrap();
    let looped = Handle::iterated_loop(&source, &init, &add_ints()).unwrap();
    assert_eq!(looped.invoke(&[]).unwrap().as_int(), Some(10));
}

#[test]
fn catch_exception_matches_class() {
    let thrown = Exception::runtime("boom");
    let target = failing(Type::Str, thrown.clone());
    let handler = Handle::native(vec![Type::Error], Type::Str, |args: &[Value]| {
        Ok(Value::str(format!("caught: {}", args[0].expect_error()?.message())))
    })
    .unwrap();

    let caught = target.catch_exception("RuntimeException", &handler).unwrap();
    assert_eq!(caught.invoke(&[]).unwrap().to_string(), "caught: boom");

    let everything = target.catch_exception(Exception::ROOT, &handler).unwrap();
    assert_eq!(everything.invoke(&[]).unwrap().to_string(), "caught: boom");

    let other = target.catch_exception("IllegalStateException", &handler).unwrap();
    let err = other.invoke(&[]).unwrap_err();
    assert_eq!(err.exception(), &thrown);
}

#[test]
fn try_finally_rethrows_original_error() {
    let thrown = Exception::runtime("x");
    let cleaned = Arc::new(Mutex::new(0));
    let counter = cleaned.clone();
    let cleanup = Handle::native(vec![Type::Error, Type::Str], Type::Str, move |args: &[Value]| {
        *counter.lock().unwrap() += 1;
        Ok(Value::str(format!("{}!", args[1])))
    })
    .unwrap();

    let ok = Handle::constant(Type::Str, Value::str("no"))
        .unwrap()
        .try_finally(&cleanup)
        .unwrap();
    assert_eq!(ok.invoke(&[]).unwrap().to_string(), "no!");

    let bad = failing(Type::Str, thrown.clone()).try_finally(&cleanup).unwrap();
    let err = bad.invoke(&[]).unwrap_err();
    assert_eq!(err.exception(), &thrown);
    assert_eq!(*cleaned.lock().unwrap(), 2);
}

#[test]
fn throw_exception_preserves_identity() {
    let thrown = Exception::runtime("same");
    let throw = Handle::throw_exception(Type::Int).unwrap();
    let err = throw.invoke(&[Value::Error(thrown.clone())]).unwrap_err();
    assert_eq!(err.exception(), &thrown);

    let err = throw.invoke(&[Value::Null]).unwrap_err();
    assert_eq!(err.exception().class(), "NullPointerException");
}
