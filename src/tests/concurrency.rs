use super::init_logger;
use crate::compose::{Closure, FunctionBuilder};
use crate::derive::deep_to_string;
use crate::schema::RecordSchema;
use crate::types::Type;
use crate::value::Value;
use std::thread;

#[test]
fn built_handles_are_shared_across_threads() {
    init_logger();
    let (builder, n) = FunctionBuilder::p1(Type::Int).unwrap();
    let squares = Closure::counted_loop(
        Closure::constant(0).unwrap(),
        &n,
        Closure::constant(0).unwrap(),
        |acc, i| Closure::plus(acc, Closure::mul(i, i)?),
    )
    .unwrap();
    let handle = builder.build_return(squares).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|k| {
            let handle = handle.clone();
            thread::spawn(move || handle.invoke(&[Value::Int(k)]).unwrap().as_int())
        })
        .collect();
    let results: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();
    let expected: Vec<_> = (0..8).map(|k: i32| Some((0..k).map(|i| i * i).sum::<i32>())).collect();
    assert_eq!(results, expected);
}

#[test]
fn derived_functions_run_on_worker_threads() {
    let schema = RecordSchema::new("Job", vec![("id", Type::Int), ("owner", Type::Str)]).unwrap();
    let render = deep_to_string(&schema).unwrap();
    let rendered = thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|id| {
                let schema = &schema;
                let render = &render;
                scope.spawn(move || {
                    let job = schema
                        .instantiate(vec![Value::Int(id), Value::str("ops")])
                        .unwrap();
                    render.invoke(&[job]).unwrap().to_string()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(rendered[3], "Job{id=3, owner=ops}");
    assert_eq!(rendered.len(), 4);
}
