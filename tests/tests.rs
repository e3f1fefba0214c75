use std::collections::BTreeMap;
use std::path::Path;
use std::fs::read_to_string;
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use callbridge::vm::{DeferredValue, Resolver, Status};
mod common;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Test {
    early:   bool,
    order:   Option<Vec<usize>>,
    inputs:  Vec<Input>,
    expect:  Option<Value>,
    error:   Option<String>,
    pending: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Input {
    resolve: Option<Value>,
    reject:  Option<Value>,
}

fn settle(resolver: &Resolver, input: &Input) -> Result<()> {
    match (&input.resolve, &input.reject) {
        (_, Some(reason)) => resolver.reject(reason.clone()),
        (Some(value), _)  => resolver.resolve(value.clone()),
        (None, None)      => Ok(()),
    }
}

fn execute(test: &Test) -> Result<DeferredValue> {
    let (deferreds, resolvers): (Vec<_>, Vec<_>) = test.inputs.iter().map(|_| {
        DeferredValue::pending()
    }).unzip();

    let order = match &test.order {
        Some(order) => order.clone(),
        None        => (0..test.inputs.len()).collect(),
    };

    let settle_all = || -> Result<()> {
        for index in &order {
            settle(&resolvers[*index], &test.inputs[*index])?;
        }
        Ok(())
    };

    if test.early {
        settle_all()?;
    }

    let all = DeferredValue::all(deferreds)?;

    if !test.early {
        settle_all()?;
    }

    Ok(all)
}

#[test]
fn all() -> Result<()> {
    common::trace();

    let path = Path::new(env!("CARGO_MANIFEST_DIR"));
    let file = path.join("tests/all.yml");
    let data = read_to_string(file)?;

    let tests = serde_yaml::from_str::<BTreeMap<String, Test>>(&data)?;

    for (name, test) in tests {
        println!("  test: {name}");

        let all = execute(&test)?;

        if test.pending {
            assert_eq!(all.status(), Status::Pending, "{name}");
            continue;
        }

        let outcome = all.outcome().map(|outcome| match &*outcome {
            Ok(value)   => Ok(value.clone()),
            Err(reason) => Err(reason.to_string()),
        });

        let expect = match (test.expect, test.error) {
            (_, Some(error)) => Err(error),
            (Some(value), _) => Ok(value),
            (None, None)     => Ok(Value::Array(Vec::new())),
        };

        assert_eq!(outcome, Some(expect), "{name}");
    }

    Ok(())
}
