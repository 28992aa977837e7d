use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rowfilter::condition::{Condition, Operator};
use rowfilter::config::{Evaluator, FilterConfig, FilterDefinition};
use rowfilter::executor::{FilterExecutor, JsonSource, RowSource};
use rowfilter::group::{evaluate_flat, ConditionGroup, ConditionTree, GroupItem};
use rowfilter::list::hierarchy::assign_operand_levels;
use rowfilter::list::{ConditionList, Junction, ListItem};
use rowfilter::value::{LogicalType, Value};
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;
use tempfile::NamedTempFile;

/// Nested AND/OR expression used as the reference for flat evaluation
#[derive(Debug)]
enum Shape {
    Leaf(usize),
    Group(Junction, Vec<Shape>),
}

impl Shape {
    fn eval(&self, bits: u32) -> bool {
        match self {
            Shape::Leaf(i) => bits >> i & 1 == 1,
            Shape::Group(Junction::And, children) => children.iter().all(|c| c.eval(bits)),
            Shape::Group(Junction::Or, children) => children.iter().any(|c| c.eval(bits)),
        }
    }

    /// Flatten with each group's junctions on the group's depth
    fn flatten(&self, depth: u32, out: &mut Vec<GroupItem<usize>>) {
        match self {
            Shape::Leaf(i) => out.push(GroupItem::leaf(*i, depth)),
            Shape::Group(junction, children) => {
                for (n, child) in children.iter().enumerate() {
                    if n > 0 {
                        out.push(GroupItem::operator(*junction, depth));
                    }
                    match child {
                        Shape::Leaf(_) => child.flatten(depth, out),
                        Shape::Group(..) => child.flatten(depth + 1, out),
                    }
                }
            }
        }
    }
}

fn random_group(rng: &mut StdRng, depth: u32, leaves: &mut usize, max_leaves: usize) -> Shape {
    let junction = if rng.gen_bool(0.5) {
        Junction::And
    } else {
        Junction::Or
    };
    let width = rng.gen_range(2..=3);
    let mut children = Vec::new();
    for _ in 0..width {
        if *leaves >= max_leaves {
            break;
        }
        if depth < 3 && max_leaves - *leaves >= 2 && rng.gen_bool(0.4) {
            children.push(random_group(rng, depth + 1, leaves, max_leaves));
        } else {
            children.push(Shape::Leaf(*leaves));
            *leaves += 1;
        }
    }
    Shape::Group(junction, children)
}

fn random_case(rng: &mut StdRng) -> (Shape, Vec<GroupItem<usize>>, usize) {
    let max_leaves = rng.gen_range(1..=6);
    let mut leaves = 0;
    let shape = random_group(rng, 0, &mut leaves, max_leaves);
    let mut items = Vec::new();
    shape.flatten(0, &mut items);
    assign_operand_levels(&mut items);
    (shape, items, leaves)
}

#[test]
fn test_stack_machine_matches_tree() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let (shape, items, leaves) = random_case(&mut rng);
        let tree = ConditionTree::from_items(items.clone()).expect("tree has leaves");
        let rebuilt = ConditionTree::from_items(
            ConditionTree::from_items(items.clone())
                .expect("tree has leaves")
                .into_items(),
        )
        .expect("tree has leaves");

        for bits in 0..(1u32 << leaves) {
            let expected = shape.eval(bits);
            let mut leaf = |i: &usize| bits >> i & 1 == 1;
            assert_eq!(
                evaluate_flat(&items, &mut leaf),
                expected,
                "stack machine on {:?} with bits {:b}",
                shape,
                bits
            );
            assert_eq!(
                tree.evaluate(&mut leaf),
                expected,
                "tree on {:?} with bits {:b}",
                shape,
                bits
            );
            assert_eq!(rebuilt.evaluate(&mut leaf), expected);
        }
    }
}

fn boolean_list(items: &[GroupItem<usize>]) -> ConditionList {
    items
        .iter()
        .map(|item| match item {
            GroupItem::Leaf { leaf, level } => ListItem::condition(
                format!("c{}", leaf),
                Condition::new(LogicalType::Boolean, Operator::EqualTo).with_value(true),
                *level,
            ),
            GroupItem::Operator { junction, level } => ListItem::junction(*junction, *level),
        })
        .collect()
}

#[test]
fn test_compiled_lists_and_negation() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let (shape, items, leaves) = random_case(&mut rng);
        let columns: Vec<String> = (0..leaves).map(|i| format!("c{}", i)).collect();

        let list = boolean_list(&items);
        let mut negated = list.clone();
        negated.negate();
        let mut restored = negated.clone();
        restored.negate();
        assert_eq!(restored, list);

        let group = ConditionGroup::compile(&list, &columns);
        let negated_group = ConditionGroup::compile(&negated, &columns);
        let restored_group = ConditionGroup::compile(&restored, &columns);

        for bits in 0..(1u32 << leaves) {
            let row: Vec<Value> = (0..leaves)
                .map(|i| Value::Boolean(bits >> i & 1 == 1))
                .collect();
            let expected = shape.eval(bits);
            assert_eq!(group.evaluate(&row), expected, "{} on {:b}", list, bits);
            assert_eq!(group.evaluate_stack(&row), expected);
            assert_eq!(negated_group.evaluate(&row), !expected, "{}", negated);
            assert_eq!(negated_group.evaluate_stack(&row), !expected);
            assert_eq!(restored_group.evaluate(&row), expected);
        }
    }
}

type Leaf = Box<dyn Fn(&[Value]) -> bool>;

fn column_equals(col: usize, expected: i64) -> Leaf {
    Box::new(move |row: &[Value]| row[col] == Value::Integer(expected))
}

#[test]
fn test_two_predicate_and() {
    let mut group: ConditionGroup<Leaf> = ConditionGroup::new();
    group.add_predicate(column_equals(0, 1), 0);
    group.add_operator(Junction::And, 0);
    group.add_predicate(column_equals(1, 2), 0);

    let row = |a: i64, b: i64| vec![Value::Integer(a), Value::Integer(b)];
    for (a, b, expected) in [(1, 2, true), (1, 3, false), (0, 2, false)] {
        assert_eq!(group.evaluate(&row(a, b)), expected);
        assert_eq!(group.evaluate_stack(&row(a, b)), expected);
    }
}

#[test]
fn test_mixed_precedence_short_circuit() {
    let calls = Rc::new(Cell::new(0));
    let flag = |col: usize, calls: &Rc<Cell<usize>>| -> Leaf {
        let calls = Rc::clone(calls);
        Box::new(move |row: &[Value]| {
            calls.set(calls.get() + 1);
            row[col] == Value::Boolean(true)
        })
    };

    // A OR (B AND C)
    let mut group: ConditionGroup<Leaf> = ConditionGroup::new();
    group.add_predicate(flag(0, &calls), 0);
    group.add_operator(Junction::Or, 0);
    group.add_predicate(flag(1, &calls), 1);
    group.add_operator(Junction::And, 1);
    group.add_predicate(flag(2, &calls), 1);

    let row = |a: bool, b: bool, c: bool| {
        vec![Value::Boolean(a), Value::Boolean(b), Value::Boolean(c)]
    };
    assert!(!group.evaluate(&row(false, true, false)));
    assert!(group.evaluate(&row(false, true, true)));

    calls.set(0);
    assert!(group.evaluate(&row(true, false, false)));
    assert_eq!(calls.get(), 1);

    // the stack machine reduces the deeper run first, skipping only C
    calls.set(0);
    assert!(group.evaluate_stack(&row(true, false, false)));
    assert_eq!(calls.get(), 2);
}

fn day(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn test_condition_scenarios() {
    let between = Condition::new(LogicalType::Integer, Operator::Between).with_values([10, 20]);
    assert!(between.evaluate(&Value::Integer(10)));
    assert!(between.evaluate(&Value::Integer(20)));
    assert!(!between.evaluate(&Value::Integer(9)));
    assert!(!between.evaluate(&Value::Integer(21)));

    let like = Condition::new(LogicalType::String, Operator::Like).with_value("A%Z");
    assert!(like.evaluate(&Value::string("axyzz")));
    let single = Condition::new(LogicalType::String, Operator::Like).with_value("A?Z");
    assert!(single.evaluate(&Value::string("AxZ")));
    assert!(!single.evaluate(&Value::string("AxyZ")));
    let literal = Condition::new(LogicalType::String, Operator::Like).with_value("a.(b)%");
    assert!(literal.evaluate(&Value::string("a.(b)c")));
    assert!(!literal.evaluate(&Value::string("ax(b)c")));

    let last_week = Condition::new(LogicalType::Date, Operator::DateIn).with_value("last 7 days");
    let now = noon(2024, 1, 10);
    assert!(last_week.evaluate_at(&day(2024, 1, 4), now));
    assert!(!last_week.evaluate_at(&day(2024, 1, 2), now));
    assert!(last_week.evaluate_at(&day(2024, 1, 10), now));
}

#[test]
fn test_negate_twice_restores_list() {
    let mut list = ConditionList::new();
    list.push_condition(
        "region",
        Condition::new(LogicalType::String, Operator::OneOf).with_values(["EU", "US"]),
        0,
    )
    .push_junction(Junction::Or, 0)
    .push_condition(
        "amount",
        Condition::new(LogicalType::Integer, Operator::GreaterThan).with_value(100),
        1,
    )
    .push_junction(Junction::And, 1)
    .push_condition(
        "day",
        Condition::new(LogicalType::Date, Operator::DateIn).with_value("this year"),
        1,
    );

    let original = list.clone();
    list.negate();
    assert_ne!(list, original);
    list.negate();
    assert_eq!(list, original);
}

const CONDITIONS: &str = r#"{
    "config": {"evaluator": "stack"},
    "variables": {"floor": 100},
    "conditions": [
        {"item": "condition", "column": {"name": "region"},
         "condition": {"type": "string", "operator": "ONE_OF", "values": ["EU", "APAC"]}},
        {"item": "junction", "junction": "OR", "level": 0},
        {"item": "condition", "column": {"name": "amount"}, "level": 1,
         "condition": {"type": "integer", "operator": "GREATER_THAN", "values": ["$(floor)"]}},
        {"item": "junction", "junction": "AND", "level": 1},
        {"item": "condition", "column": {"name": "day"}, "level": 1,
         "condition": {"type": "date", "operator": "DATE_IN", "values": ["last 7 days"]}}
    ]
}"#;

const ROWS: &str = r#"{
    "columns": [
        {"name": "id", "type": "integer"},
        {"name": "region"},
        {"name": "amount", "type": "integer"},
        {"name": "day", "type": "date"}
    ],
    "rows": [
        [1, "EU", 5, "2023-06-01"],
        [2, "US", 500, "2024-01-08"],
        [3, "US", 500, "2023-12-01"],
        [4, "US", 50, "2024-01-09"],
        [5, "APAC", null, null],
        [6, "US", "250", "2024-01-04"]
    ]
}"#;

fn temp_file(text: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(text.as_bytes())?;
    Ok(file)
}

fn matching_ids(filter: &mut FilterExecutor) -> Result<Vec<i64>> {
    let mut ids = Vec::new();
    while let Some(row) = filter.next()? {
        if let Value::Integer(id) = row[0] {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[test]
fn test_filter_json_files() -> Result<()> {
    let conditions = temp_file(CONDITIONS)?;
    let rows = temp_file(ROWS)?;

    let definition = FilterDefinition::from_path(conditions.path())?;
    assert_eq!(definition.config.evaluator, Evaluator::Stack);

    for evaluator in [Evaluator::Stack, Evaluator::Tree] {
        let config = FilterConfig {
            evaluator,
            ..definition.config.clone()
        };
        let mut filter = FilterExecutor::new(
            Box::new(JsonSource::open(rows.path())),
            definition.conditions.clone(),
        )
        .with_config(config)
        .with_variables(definition.variables.clone())
        .with_now(noon(2024, 1, 10));
        filter.init()?;

        assert_eq!(matching_ids(&mut filter)?, vec![1, 2, 5, 6]);
        let stats = filter.stats();
        assert_eq!((stats.scanned, stats.passed), (6, 4));
    }
    Ok(())
}

#[test]
fn test_filter_without_variable_value() -> Result<()> {
    let rows = temp_file(ROWS)?;
    let definition = FilterDefinition::from_json(CONDITIONS)?;

    // the amount condition has no value to compare with and passes every row
    let mut filter = FilterExecutor::new(
        Box::new(JsonSource::open(rows.path())),
        definition.conditions.clone(),
    )
    .with_now(noon(2024, 1, 10));
    filter.init()?;
    assert_eq!(matching_ids(&mut filter)?, vec![1, 2, 4, 5, 6]);
    Ok(())
}
