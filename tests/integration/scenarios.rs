//! Six end-to-end scenarios exercising the query engine and entity
//! materializer together, run against a live [`tripledb::Connection`] over
//! the simple in-memory graph.

use tripledb::query::ast::{
    AggArg, AggKind, Clause, FindSpec, FindVar, PatternSlot as PS, QPattern,
};
use tripledb::query::expr::ExprEnv;
use tripledb::query::project::QueryResult;
use tripledb::value::Keyword;
use tripledb::{query, Connection, Database, Graph, GraphFlavor, Query, Triple, Value};

fn kw(s: &str) -> Value {
    Value::Keyword(Keyword::new(s))
}

fn fresh_connection() -> Connection {
    Connection::new(Database::empty(Graph::new(GraphFlavor::Simple)), 100_000)
}

#[test]
fn scenario_1_basic_join() {
    let conn = fresh_connection();
    let n1 = tripledb::node::new_node();
    let n2 = tripledb::node::new_node();

    conn.transact(|g, tx| {
        let triples = vec![
            Triple::new(n1, kw("artist/name"), "Paul"),
            Triple::new(n2, kw("release/artists"), n1),
            Triple::new(n2, kw("release/name"), "MSL"),
        ];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();

    let db = conn.current().unwrap();
    let q = Query::new(
        FindSpec::Relation(vec![FindVar::Var("?name".into())]),
        vec![
            Clause::Pattern(QPattern::new(
                PS::var("?r"),
                PS::constant(kw("release/name")),
                PS::constant("MSL"),
            )),
            Clause::Pattern(QPattern::new(
                PS::var("?r"),
                PS::constant(kw("release/artists")),
                PS::var("?a"),
            )),
            Clause::Pattern(QPattern::new(
                PS::var("?a"),
                PS::constant(kw("artist/name")),
                PS::var("?name"),
            )),
        ],
    );

    let env = ExprEnv::new();
    let result = query(&db.graph, &q, &env, &[]).unwrap();
    let QueryResult::Relation(_, tuples) = result else {
        panic!("expected relation")
    };
    assert_eq!(tuples, vec![vec![Value::Str("Paul".into())]]);
}

#[test]
fn scenario_2_grouped_count() {
    let conn = fresh_connection();
    let address_a = kw("address-a");
    let address_b = kw("address-b");

    conn.transact(|g, tx| {
        let mut triples = Vec::new();
        let parent_a = tripledb::node::new_node();
        let parent_b = tripledb::node::new_node();
        triples.push(Triple::new(parent_a, kw("address"), address_a.clone()));
        triples.push(Triple::new(parent_b, kw("address"), address_b.clone()));
        for _ in 0..4 {
            triples.push(Triple::new(parent_a, kw("child"), tripledb::node::new_node()));
        }
        for _ in 0..2 {
            triples.push(Triple::new(parent_b, kw("child"), tripledb::node::new_node()));
        }
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();

    let db = conn.current().unwrap();
    let q = Query::new(
        FindSpec::Relation(vec![
            FindVar::Var("?addr".into()),
            FindVar::Agg(AggKind::Count, AggArg::Var("?child".into())),
        ]),
        vec![
            Clause::Pattern(QPattern::new(
                PS::var("?p"),
                PS::constant(kw("address")),
                PS::var("?addr"),
            )),
            Clause::Pattern(QPattern::new(
                PS::var("?p"),
                PS::constant(kw("child")),
                PS::var("?child"),
            )),
        ],
    );

    let env = ExprEnv::new();
    let result = query(&db.graph, &q, &env, &[]).unwrap();
    let QueryResult::Relation(_, tuples) = result else {
        panic!("expected relation")
    };
    assert_eq!(tuples.len(), 2);
    let find_count = |addr: &Value| {
        tuples
            .iter()
            .find(|t| &t[0] == addr)
            .map(|t| t[1].clone())
            .unwrap()
    };
    assert_eq!(find_count(&address_a), Value::Int(4));
    assert_eq!(find_count(&address_b), Value::Int(2));
}

#[test]
fn scenario_3_or_disjunction() {
    let conn = fresh_connection();
    let n1 = tripledb::node::new_node();
    let n2 = tripledb::node::new_node();

    conn.transact(|g, tx| {
        let triples = vec![
            Triple::new(n1, kw("verdict"), kw("v1")),
            Triple::new(n2, kw("sighting"), kw("s1")),
        ];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();

    let db = conn.current().unwrap();
    let q = Query::new(
        FindSpec::Relation(vec![FindVar::Var("?o".into()), FindVar::Var("?r".into())]),
        vec![Clause::Or(vec![
            vec![Clause::Pattern(QPattern::new(
                PS::var("?o"),
                PS::constant(kw("verdict")),
                PS::var("?r"),
            ))],
            vec![Clause::Pattern(QPattern::new(
                PS::var("?o"),
                PS::constant(kw("sighting")),
                PS::var("?r"),
            ))],
        ])],
    );

    let env = ExprEnv::new();
    let result = query(&db.graph, &q, &env, &[]).unwrap();
    let QueryResult::Relation(_, tuples) = result else {
        panic!("expected relation")
    };
    assert_eq!(tuples.len(), 2);
    assert!(tuples.contains(&vec![Value::Node(n1), kw("v1")]));
    assert!(tuples.contains(&vec![Value::Node(n2), kw("s1")]));
}

#[test]
fn scenario_4_negation_with_join() {
    let conn = fresh_connection();
    let internal = tripledb::node::new_node();
    let external = tripledb::node::new_node();

    conn.transact(|g, tx| {
        let triples = vec![
            Triple::new(internal, kw("internal"), Value::Bool(true)),
            Triple::new(internal, kw("label"), "keep-out"),
            Triple::new(external, kw("label"), "visible"),
        ];
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();

    let db = conn.current().unwrap();
    let q = Query::new(
        FindSpec::Relation(vec![FindVar::Var("?o".into())]),
        vec![
            Clause::Pattern(QPattern::new(PS::var("?o"), PS::constant(kw("label")), PS::var("?l"))),
            Clause::Not(vec![Clause::Pattern(QPattern::new(
                PS::var("?o"),
                PS::constant(kw("internal")),
                PS::constant(Value::Bool(true)),
            ))]),
        ],
    );

    let env = ExprEnv::new();
    let result = query(&db.graph, &q, &env, &[]).unwrap();
    let QueryResult::Relation(_, tuples) = result else {
        panic!("expected relation")
    };
    assert_eq!(tuples, vec![vec![Value::Node(external)]]);
}

#[test]
fn scenario_5_aggregate_projection_forms() {
    let conn = fresh_connection();

    conn.transact(|g, tx| {
        let mut triples = Vec::new();
        for _ in 0..3 {
            let parent = tripledb::node::new_node();
            for _ in 0..7 / 3 {
                triples.push(Triple::new(parent, kw("child"), tripledb::node::new_node()));
            }
        }
        // Top up to exactly 7 children across 3 parents (3 + 2 + 2).
        let last_parent = match triples.last().unwrap().s.clone() {
            Value::Node(n) => n,
            _ => unreachable!(),
        };
        triples.push(Triple::new(last_parent, kw("child"), tripledb::node::new_node()));
        (g.transact(tx, &triples, &[]), triples)
    })
    .unwrap();

    let db = conn.current().unwrap();
    let env = ExprEnv::new();

    let count_children = Query::new(
        FindSpec::Scalar(FindVar::Agg(AggKind::Count, AggArg::Var("?c".into()))),
        vec![Clause::Pattern(QPattern::new(
            PS::var("?p"),
            PS::constant(kw("child")),
            PS::var("?c"),
        ))],
    );
    let result = query(&db.graph, &count_children, &env, &[]).unwrap();
    assert_eq!(result, QueryResult::Scalar(Value::Int(7)));

    let count_rows = Query::new(
        FindSpec::Scalar(FindVar::Agg(AggKind::Count, AggArg::Star)),
        vec![Clause::Pattern(QPattern::new(
            PS::var("?p"),
            PS::constant(kw("child")),
            PS::var("?c"),
        ))],
    );
    let result = query(&db.graph, &count_rows, &env, &[]).unwrap();
    assert_eq!(result, QueryResult::Scalar(Value::Int(7)));

    let count_distinct_children = Query::new(
        FindSpec::Scalar(FindVar::Agg(AggKind::CountDistinct, AggArg::Var("?c".into()))),
        vec![Clause::Pattern(QPattern::new(
            PS::var("?p"),
            PS::constant(kw("child")),
            PS::var("?c"),
        ))],
    );
    let result = query(&db.graph, &count_distinct_children, &env, &[]).unwrap();
    assert_eq!(result, QueryResult::Scalar(Value::Int(7)));
}

#[test]
fn scenario_6_time_travel() {
    let conn = fresh_connection();

    conn.transact(|g, tx| (g.add(kw("a"), kw("p"), kw("b"), tx), vec![]))
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    conn.transact(|g, tx| (g.add(kw("c"), kw("p"), kw("d"), tx), vec![]))
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(2));
    conn.transact(|g, tx| (g.add(kw("e"), kw("p"), kw("f"), tx), vec![]))
        .unwrap();

    let db = conn.current().unwrap();
    assert_eq!(db.t, 3);

    let as_of_1 = conn.as_of(tripledb::db::AsOf::T(1)).unwrap();
    assert_eq!(as_of_1.t, 1);
    assert!(as_of_1.graph.count_triple(&tripledb::graph::Pattern::new(
        tripledb::graph::Slot::Const(kw("a")),
        tripledb::graph::Slot::Const(kw("p")),
        tripledb::graph::Slot::Const(kw("b")),
    )) == 1);
    assert!(as_of_1.graph.count_triple(&tripledb::graph::Pattern::new(
        tripledb::graph::Slot::Const(kw("c")),
        tripledb::graph::Slot::Const(kw("p")),
        tripledb::graph::Slot::Const(kw("d")),
    )) == 0);

    // since() is evaluated against the connection's full (latest) timeline,
    // not the narrower ancestor chain bundled inside a past snapshot: a
    // `Database` only remembers the ancestors that existed when it was
    // built, so asking an old snapshot about the future would find nothing.
    let since_result = conn.since(&as_of_1.timestamp).unwrap();
    assert!(since_result.is_some());
    assert_eq!(since_result.unwrap().t, 2);
}
