use super::*;
use crate::value::Value;

fn my_data() -> Arc<RecordSchema> {
    RecordSchema::new(
        "MyData",
        vec![("i", Type::Int), ("s", Type::Str), ("l", Type::Long)],
    )
    .expect("schema")
}

fn data(schema: &Arc<RecordSchema>, i: i32, s: &str, l: i64) -> Value {
    schema
        .instantiate(vec![Value::Int(i), Value::str(s), Value::Long(l)])
        .expect("instance")
}

#[test]
fn deep_equals_compares_fields() {
    let schema = my_data();
    let other = RecordSchema::new("Other", vec![("i", Type::Int)]).unwrap();
    let equals = deep_equals(&schema).unwrap();
    let a = data(&schema, 1, "a", 2);
    let check = |x: &Value, y: &Value| equals.invoke(&[x.clone(), y.clone()]).unwrap().as_bool();

    assert_eq!(check(&a, &a), Some(true));
    assert_eq!(check(&a, &data(&schema, 1, "a", 2)), Some(true));
    assert_eq!(check(&a, &data(&schema, 1, "b", 2)), Some(false));
    assert_eq!(check(&a, &Value::Null), Some(false));
    assert_eq!(check(&a, &Value::str("a")), Some(false));
    let foreign = other.instantiate(vec![Value::Int(1)]).unwrap();
    assert_eq!(check(&a, &foreign), Some(false));
    let twin = my_data();
    assert_eq!(check(&a, &data(&twin, 1, "a", 2)), Some(false));
}

#[test]
fn deep_hash_code_folds_fields() {
    let schema = RecordSchema::new("Pair", vec![("i", Type::Int), ("s", Type::Str)]).unwrap();
    let hash = deep_hash_code(&schema).unwrap();
    let pair = schema
        .instantiate(vec![Value::Int(1), Value::str("a")])
        .unwrap();
    let expected = 31 + Value::str("a").hash_code();
    assert_eq!(hash.invoke(&[pair]).unwrap().as_int(), Some(expected));

    let nulls = schema.instantiate(vec![Value::Int(0), Value::Null]).unwrap();
    assert_eq!(hash.invoke(&[nulls]).unwrap().as_int(), Some(0));
}

#[test]
fn deep_to_string_renders_fields() {
    let schema = RecordSchema::new("MyData", vec![("i", Type::Int), ("s", Type::Str)]).unwrap();
    let to_string = deep_to_string(&schema).unwrap();
    let value = schema
        .instantiate(vec![Value::Int(1), Value::str("a")])
        .unwrap();
    assert_eq!(to_string.invoke(&[value]).unwrap().to_string(), "MyData{i=1, s=a}");

    let empty = RecordSchema::new("Empty", Vec::new()).unwrap();
    let to_string = deep_to_string(&empty).unwrap();
    let value = empty.instantiate(Vec::new()).unwrap();
    assert_eq!(to_string.invoke(&[value]).unwrap().to_string(), "Empty{}");
}

#[test]
fn deep_compare_is_lexicographic() {
    let schema = my_data();
    let compare = deep_compare(&schema).unwrap();
    let cmp = |a: Value, b: Value| compare.invoke(&[a, b]).unwrap().as_int().unwrap();

    assert_eq!(cmp(data(&schema, 10, "a", 20), data(&schema, 10, "a", 20)), 0);
    assert!(cmp(data(&schema, 10, "a", 20), data(&schema, 11, "a", 20)) < 0);
    assert!(cmp(data(&schema, 11, "a", 20), data(&schema, 10, "a", 20)) > 0);
    assert!(cmp(data(&schema, 10, "asd", 20), data(&schema, 11, "d", 20)) < 0);
    assert!(cmp(data(&schema, 11, "g", 20), data(&schema, 10, "b", 20)) > 0);
    assert!(cmp(data(&schema, 10, "a", 20), data(&schema, 10, "b", 20)) < 0);
    assert!(cmp(data(&schema, 10, "b", 20), data(&schema, 10, "a", 13)) > 0);
    let same = data(&schema, 1, "x", 1);
    assert_eq!(cmp(same.clone(), same), 0);
}

#[test]
fn sum_fields_adds_int_fields() {
    let schema = RecordSchema::new(
        "Data",
        vec![("a", Type::Int), ("label", Type::Str), ("b", Type::Int)],
    )
    .unwrap();
    let sum = sum_fields(&schema).unwrap();
    let value = schema
        .instantiate(vec![Value::Int(2), Value::str("x"), Value::Int(3)])
        .unwrap();
    assert_eq!(sum.invoke(&[value]).unwrap().as_int(), Some(5));
}

#[test]
fn add_counters_accumulates() {
    let schema = RecordSchema::new(
        "Counter",
        vec![("bytes", Type::Long), ("users", Type::Int), ("errors", Type::Int)],
    )
    .unwrap();
    let add = add_counters(&schema).unwrap();
    let total = schema.instantiate_default();
    for (bytes, users, errors) in [(100, 3, 0), (200, 0, 1)] {
        let delta = schema
            .instantiate(vec![Value::Long(bytes), Value::Int(users), Value::Int(errors)])
            .unwrap();
        add.invoke(&[total.clone(), delta]).unwrap();
    }
    assert_eq!(total.to_string(), "Counter{bytes=300, users=3, errors=1}");
}

#[test]
fn flat_list_grows_and_reads_back() {
    let schema = RecordSchema::new("Row", vec![("id", Type::Int), ("name", Type::Str)]).unwrap();
    let factory = FlatArrayFactory::new(&schema).unwrap();
    let mut list = factory.new_list();
    assert!(list.is_empty());
    for id in 0..25 {
        let row = schema
            .instantiate(vec![Value::Int(id), Value::str(format!("row{id}"))])
            .unwrap();
        list.push(row).unwrap();
    }
    assert_eq!(list.len(), 25);
    assert_eq!(list.get(0).unwrap().to_string(), "Row{id=0, name=row0}");
    assert_eq!(list.get(24).unwrap().to_string(), "Row{id=24, name=row24}");
    let err = list.get(25).unwrap_err();
    assert_eq!(err.exception().class(), "IndexOutOfBoundsException");

    let other = factory.new_list();
    assert!(other.is_empty());
}
