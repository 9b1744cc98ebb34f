//! Entity materialization driven through a live, transacting connection
//! rather than a bare [`tripledb::Graph`] value.

use std::collections::BTreeSet;

use tripledb::value::Keyword;
use tripledb::{materialize_entity, node, Connection, Database, Doc, Graph, GraphFlavor, Triple, Value};

fn kw(s: &str) -> Value {
    Value::Keyword(Keyword::new(s))
}

fn fresh_connection() -> Connection {
    Connection::new(Database::empty(Graph::new(GraphFlavor::Simple)), 100_000)
}

#[test]
fn materializes_an_entity_built_up_across_several_transactions() {
    let conn = fresh_connection();
    let person = node::new_node();

    conn.transact(|g, tx| {
        let triples = vec![Triple::new(person, kw("name"), "Ada")];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();
    conn.transact(|g, tx| {
        let triples = vec![Triple::new(person, kw("age"), Value::Int(36))];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();

    let db = conn.current().unwrap();
    let doc = materialize_entity(&db.graph, person, true);
    let Doc::Map(pairs) = doc else { panic!("expected map") };
    assert!(pairs.iter().any(|(k, v)| k.as_str() == "name" && *v == Doc::Scalar(Value::Str("Ada".into()))));
    assert!(pairs.iter().any(|(k, v)| k.as_str() == "age" && *v == Doc::Scalar(Value::Int(36))));
}

#[test]
fn retraction_in_a_later_transaction_removes_the_attribute_from_the_materialized_doc() {
    let conn = fresh_connection();
    let person = node::new_node();
    let home = Triple::new(person, kw("city"), "Boston");

    conn.transact(|g, tx| {
        let triples = vec![home.clone()];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();
    conn.transact(|g, tx| (g.transact(tx, &[], std::slice::from_ref(&home)), vec![home.clone()]))
        .unwrap();

    let db = conn.current().unwrap();
    let doc = materialize_entity(&db.graph, person, true);
    let Doc::Map(pairs) = doc else { panic!("expected map") };
    assert!(pairs.is_empty());
}

#[test]
fn time_travel_materializes_the_entity_as_it_stood_at_an_earlier_transaction() {
    let conn = fresh_connection();
    let person = node::new_node();

    conn.transact(|g, tx| {
        let triples = vec![Triple::new(person, kw("status"), kw("draft"))];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();
    let t1 = conn.current().unwrap().t;

    let status_draft = Triple::new(person, kw("status"), kw("draft"));
    conn.transact(|g, tx| {
        let asserts = vec![Triple::new(person, kw("status"), kw("published"))];
        (
            g.transact(tx, &asserts, std::slice::from_ref(&status_draft)),
            [vec![status_draft.clone()], asserts].concat(),
        )
    })
    .unwrap();

    let past = conn.as_of(tripledb::db::AsOf::T(t1 as i64)).unwrap();
    let doc = materialize_entity(&past.graph, person, true);
    let Doc::Map(pairs) = doc else { panic!("expected map") };
    let (_, status) = pairs.iter().find(|(k, _)| k.as_str() == "status").unwrap();
    assert_eq!(*status, Doc::Scalar(kw("draft")));

    let now = conn.current().unwrap();
    let doc = materialize_entity(&now.graph, person, true);
    let Doc::Map(pairs) = doc else { panic!("expected map") };
    let (_, status) = pairs.iter().find(|(k, _)| k.as_str() == "status").unwrap();
    assert_eq!(*status, Doc::Scalar(kw("published")));
}

#[test]
fn multi_valued_attribute_set_across_transactions_collapses_to_a_values_set() {
    let conn = fresh_connection();
    let person = node::new_node();

    for tag in ["engineer", "writer", "parent"] {
        conn.transact(|g, tx| {
            let triples = vec![Triple::new(person, kw("tag"), kw(tag))];
            (g.transact(tx, &triples, &[]), triples)
        })
        .unwrap();
    }

    let db = conn.current().unwrap();
    let doc = materialize_entity(&db.graph, person, true);
    let Doc::Map(pairs) = doc else { panic!("expected map") };
    let (_, tag_doc) = pairs.iter().find(|(k, _)| k.as_str() == "tag").unwrap();
    let Doc::Values(set) = tag_doc else { panic!("expected values set") };
    let expected: BTreeSet<Value> = ["engineer", "writer", "parent"].iter().map(|s| kw(s)).collect();
    assert_eq!(*set, expected);
}
