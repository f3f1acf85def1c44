use jsonkit_core::{path, Error, Node, Path, PathBuilder, Position, TypeTag};
use jsonkit_store::{Condition, Filter, MissPolicy, Store, StoreConfig};
use serde_json::json;

fn catalog() -> Store {
    Store::from_node(json!({
        "store": {
            "book": [
                {"category": "reference", "author": "Nigel Rees", "title": "Sayings of the Century", "price": 8.95},
                {"category": "fiction", "author": "Evelyn Waugh", "title": "Sword of Honour", "price": 12.99},
                {"category": "fiction", "author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
                {"category": "fiction", "author": "J. R. R. Tolkien", "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
            ],
            "bicycle": {"color": "red", "price": 19.95}
        }
    }))
}

fn json_of(store: &Store) -> serde_json::Value {
    serde_json::Value::from(store.object().clone())
}

#[test]
fn set_then_get() {
    let mut store = Store::new();
    store.set("/a/b/c", "value").unwrap();
    assert_eq!(store.get_at("a/b/c").unwrap(), Node::from("value"));
    assert_eq!(json_of(&store), json!({"a": {"b": {"c": "value"}}}));
}

#[test]
fn index_paths_read_back_what_was_written() {
    let mut store = Store::from_node(json!({"list": [1, 2, 3]}));
    store.set("/list/7", "v").unwrap();
    assert_eq!(store.get_at("/list/7").unwrap(), Node::from("v"));
    assert_eq!(store.get_at("/list/4").unwrap(), Node::Null);
    assert_eq!(store.view("/list").map(Node::len), Some(8));

    let mut empty = Store::new();
    empty.set("/x/5/c", 1).unwrap();
    assert_eq!(empty.get_at("/x/5/c").unwrap(), Node::Int(1));
    assert_eq!(json_of(&empty), json!({"x": [null, null, null, null, null, {"c": 1}]}));
}

#[test]
fn named_key_on_an_array_turns_it_into_an_object() {
    let mut store = Store::from_node(json!({"list": ["a", "b"]}));
    store.set("/list/name", "v").unwrap();
    assert_eq!(store.get_at("/list/name").unwrap(), Node::from("v"));
    assert_eq!(json_of(&store), json!({"list": {"0": "a", "1": "b", "name": "v"}}));
}

#[test]
fn paths_are_normalized() {
    let mut store = catalog();
    let expected = store.get_at("/store/bicycle").unwrap();
    assert_eq!(store.get_at("store/bicycle/").unwrap(), expected);
    assert_eq!(store.get_at(" /store/bicycle/* ").unwrap(), expected);
    assert_eq!(
        store.get_at(PathBuilder::new().segment("store").segment("bicycle").resolve()).unwrap(),
        expected
    );
}

#[test]
fn missing_values_follow_the_miss_policy() {
    let mut lenient = catalog();
    assert_eq!(lenient.get_at("/store/car").unwrap(), Node::Null);
    lenient.remove("/store/car").unwrap();
    lenient.reset("/store/car/wheels").unwrap();
    assert_eq!(json_of(&lenient), json_of(&catalog()));

    let mut custom = Store::with_config(StoreConfig {
        miss: MissPolicy {
            throw_on_miss: false,
            default_value: Node::from("n/a"),
        },
        ..StoreConfig::default()
    });
    assert_eq!(custom.get_at("/x").unwrap(), Node::from("n/a"));

    let mut strict = Store::with_config(StoreConfig::strict());
    strict.set_object(json!({"a": 1}));
    assert!(strict.get_at("/b").unwrap_err().is_empty_result());
    assert!(strict.remove("/b").unwrap_err().is_empty_result());
    assert!(strict.replace("/b", 2, false).unwrap_err().is_empty_result());
}

#[test]
fn reset_keeps_the_key() {
    let mut store = catalog();
    store.reset("/store/bicycle/color").unwrap();
    assert_eq!(
        json_of(&store)["store"]["bicycle"],
        json!({"color": null, "price": 19.95})
    );
}

#[test]
fn existing_null_counts_as_present() {
    let mut store = Store::from_node(json!({"slot": null}));
    store.add("/slot", 1).unwrap();
    assert_eq!(store.get_at("/slot").unwrap(), Node::Null);
    store.replace("/slot", 2, false).unwrap();
    assert_eq!(store.get_at("/slot").unwrap(), Node::Int(2));
}

#[test]
fn typesafe_replace() {
    let mut store = catalog();
    let err = store
        .replace("/store/bicycle/price", "cheap", true)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch {
            existing: TypeTag::Float,
            incoming: TypeTag::String,
            ..
        }
    ));
    store.replace("/store/bicycle/price", 9.99, true).unwrap();
    store.replace("/store/bicycle/price", "cheap", false).unwrap();
    assert_eq!(store.get_at("/store/bicycle/price").unwrap(), Node::from("cheap"));
}

#[test]
fn add_only_writes_absent_keys() {
    let mut store = catalog();
    store.add("/store/bicycle/color", "blue").unwrap();
    store.add_entry("/store/bicycle", "gears", 18).unwrap();
    store.add_entry("/store/bicycle", "gears", 21).unwrap();
    assert_eq!(
        json_of(&store)["store"]["bicycle"],
        json!({"color": "red", "price": 19.95, "gears": 18})
    );
}

#[test]
fn array_insertions() {
    let mut store = Store::from_node(json!({"list": ["b", "c"]}));
    store.prepend("/list", "a").unwrap();
    store.append("/list", "e").unwrap();
    store.inject("/list/3", "d").unwrap();
    store.inject_at("/list", "z", Position::Last).unwrap();
    store.set_at("/list", "Z", Position::Last).unwrap();
    assert_eq!(json_of(&store), json!({"list": ["a", "b", "c", "d", "e", "Z"]}));

    store.append("/other", 1).unwrap();
    store.prepend("/other", 0).unwrap();
    assert_eq!(json_of(&store)["other"], json!([0, 1]));
}

#[test]
fn remove_array_elements_shifts_indices() {
    let mut store = catalog();
    store.remove("/store/book/0").unwrap();
    assert_eq!(
        store.get_at("/store/book/0/title").unwrap(),
        Node::from("Sword of Honour")
    );
    assert_eq!(store.view("/store/book").map(Node::len), Some(3));
}

#[test]
fn cursor_chains_and_resets() {
    let mut store = catalog();
    let cheapest = store
        .query("/store")
        .unwrap()
        .query("book/0")
        .unwrap()
        .get()
        .unwrap();
    assert_eq!(cheapest.get(&path!("price")), Some(&Node::Float(8.95)));

    store.query("/store/book/1").unwrap();
    assert!(store.has_result());
    let released = store.init().unwrap().unwrap();
    assert_eq!(released.get(&path!("author")), Some(&Node::from("Evelyn Waugh")));
    assert!(!store.has_result());
    assert_eq!(store.init().unwrap(), None);
}

#[test]
fn init_reports_a_vanished_cursor_target() {
    let mut store = Store::with_config(StoreConfig::strict());
    store.set_object(json!({"a": {"b": 1}}));
    store.query("/a").unwrap();
    *store.at_mut(&Path::root()).unwrap() = Node::object();
    assert!(matches!(store.init(), Err(Error::EmptyResult { .. })));
    assert!(!store.has_result());
}

#[test]
fn conditional_queries() {
    let mut store = catalog();
    let pricey_fiction: Vec<Condition> = vec!["category=fiction".parse().unwrap(), "price>10".parse().unwrap()];

    let first = store.find("/store/book", &pricey_fiction, Filter::First).unwrap();
    assert_eq!(first.get(&path!("title")), Some(&Node::from("Sword of Honour")));

    let all = store.find("/store/book", &pricey_fiction, Filter::All).unwrap();
    assert_eq!(all.len(), 2);

    let none = store
        .find("/store/book", &["price>100".parse().unwrap()], Filter::All)
        .unwrap();
    assert_eq!(none, Node::Null);
}

#[test]
fn writes_through_a_filtered_cursor() {
    let mut store = catalog();
    store
        .query_where("/store/book", &[Condition::eq("isbn", "0-553-21311-3")], Filter::First)
        .unwrap()
        .set("price", 5.0)
        .unwrap()
        .append("tags", "classic")
        .unwrap();
    store.init().unwrap();
    assert_eq!(
        json_of(&store)["store"]["book"][2]["tags"],
        json!(["classic"])
    );
    assert_eq!(store.get_at("/store/book/2/price").unwrap(), Node::Float(5.0));
}

#[test]
fn removing_through_a_filtered_cursor_reaches_the_document() {
    let mut store = catalog();
    let fiction = [Condition::eq("category", "fiction")];
    store
        .query_where("/store/book", &fiction, Filter::All)
        .unwrap()
        .remove("0")
        .unwrap()
        .set("0/price", 1.0)
        .unwrap();
    let remaining = store.init().unwrap().unwrap();
    assert_eq!(remaining.len(), 2);

    let books = &json_of(&store)["store"]["book"];
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Sayings of the Century", "Moby Dick", "The Lord of the Rings"]);
    assert_eq!(books[1]["price"], json!(1.0));
    assert_eq!(books[2]["price"], json!(22.99));
}

#[test]
fn shape_changing_writes_through_a_filtered_cursor_are_refused() {
    let mut store = catalog();
    let fiction = [Condition::eq("category", "fiction")];
    store.query_where("/store/book", &fiction, Filter::All).unwrap();

    let err = store.append("", json!({"title": "New"})).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
    let err = store.set("title", "Renamed").unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));

    assert_eq!(store.get().unwrap().len(), 3);
    assert_eq!(store.view("/store/book").map(Node::len), Some(4));
    assert_eq!(json_of(&store), json_of(&catalog()));
}

#[test]
fn copy_and_merge() {
    let mut store = Store::from_node(json!({
        "defaults": {"color": "red", "size": "m"},
        "user": {"size": "l"},
        "tmp": [1]
    }));
    store.merge("/user", "/defaults").unwrap();
    assert_eq!(
        json_of(&store)["defaults"],
        json!({"color": "red", "size": "l"})
    );
    assert!(!store.has("/user"));

    store.copy("/defaults", "/settings/profile").unwrap();
    assert!(!store.has("/defaults"));
    assert_eq!(
        store.get_at("/settings/profile/size").unwrap(),
        Node::from("l")
    );

    assert!(store.merge("/missing", "/tmp").unwrap_err().is_empty_result());
}

#[test]
fn iterate_visits_children_first_and_stops_early() {
    use std::ops::ControlFlow;

    let mut store = Store::from_node(json!({"a": {"b": 1}, "c": [2]}));
    let mut seen = Vec::new();
    store.iterate(|key, _, path| {
        seen.push(format!("{}={}", key, path));
        ControlFlow::Continue(())
    });
    assert_eq!(seen, vec!["b=/a/b", "a=/a", "0=/c/0", "c=/c"]);

    let mut count = 0;
    store.iterate(|_, _, _| {
        count += 1;
        if count == 2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(count, 2);
}

#[test]
fn whole_document_operations() {
    let mut store = catalog();
    store.set("/", json!({"fresh": true})).unwrap();
    assert_eq!(json_of(&store), json!({"fresh": true}));
    store.remove("/").unwrap();
    assert!(store.object().is_null());
}
