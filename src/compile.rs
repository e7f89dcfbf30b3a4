use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::evaluate::{defaults, Declarations};
use crate::types::{CompiledScheme, DependentRules, Fact, Operand, Rule, Scheme, Test};
use crate::CompareOp;

/// Compile the accumulated facts of `scheme` into per-property rules and the
/// content-addressed base block.
#[tracing::instrument(level = "debug", skip_all, fields(scheme = %scheme.name))]
pub(crate) fn compile(scheme: Scheme) -> CompiledScheme {
    let mut rules: BTreeMap<String, Vec<Rule>> = BTreeMap::new();
    let mut dependents: BTreeMap<String, DependentRules> = BTreeMap::new();

    for (property, tests) in &scheme.conditions {
        let (independent, dependent) = compile_property(property, tests);
        if !independent.is_empty() {
            rules.insert(property.clone(), independent);
        }
        if !dependent.is_empty() {
            let mut properties: BTreeSet<String> = dependent
                .iter()
                .filter_map(Rule::dependency)
                .map(str::to_owned)
                .collect();
            properties.insert(property.clone());
            dependents.insert(
                property.clone(),
                DependentRules {
                    properties: properties.into_iter().collect(),
                    rules: dependent,
                },
            );
        }
    }

    let mut base = Declarations::new(&scheme.options);
    for (name, value) in &scheme.prepared {
        base.push_value(name, value);
    }
    for rule_list in rules.values() {
        defaults(rule_list, &mut base);
    }
    for dependent in dependents.values() {
        defaults(&dependent.rules, &mut base);
    }
    let base = base.finish();
    let base_key = crate::fingerprint::content_key(&scheme.options.key_prefix, &base);

    tracing::debug!(
        properties = scheme.properties.len(),
        rules = rules.values().map(Vec::len).sum::<usize>(),
        dependents = dependents.len(),
        prepared = scheme.prepared.len(),
        %base_key,
        "compiled scheme"
    );

    let mut compiled = CompiledScheme {
        name: scheme.name,
        options: scheme.options,
        properties: scheme.properties,
        rules,
        dependents,
        base_key: base_key.clone(),
        blocks: Vec::new(),
        index: HashMap::new(),
        flushed: 0,
    };
    compiled.insert(base_key, base);
    compiled
}

/// Split one property's tests into rules that read only that property and
/// rules that also read another one.
fn compile_property(property: &str, tests: &BTreeSet<Test>) -> (Vec<Rule>, Vec<Rule>) {
    let mut independent = Vec::new();
    let mut dependent = Vec::new();
    // `==` and `!=` against the same operand share one rule.
    let mut equalities: BTreeSet<&Operand> = BTreeSet::new();

    for test in tests {
        let rule = match test {
            Test::Truthy { negated: false } => Rule::Truthy {
                property: property.to_owned(),
                flag: Fact::truthy(property, false).name(),
            },
            Test::Truthy { negated: true } => Rule::Falsy {
                property: property.to_owned(),
                flag: Fact::truthy(property, true).name(),
            },
            Test::Compare { op, operand } if op.is_equality() => {
                if !equalities.insert(operand) {
                    continue;
                }
                equality_rule(property, operand)
            }
            Test::Compare { op, operand } => Rule::Relational {
                property: property.to_owned(),
                op: *op,
                operand: operand.clone(),
                flag: Fact::compare(property, *op, operand.clone()).name(),
            },
        };
        if rule.dependency().is_some() {
            dependent.push(rule);
        } else {
            independent.push(rule);
        }
    }
    (independent, dependent)
}

fn equality_rule(property: &str, operand: &Operand) -> Rule {
    let positive = Fact::compare(property, CompareOp::Eq, operand.clone()).name();
    let complement = Fact::compare(property, CompareOp::Neq, operand.clone()).name();
    match operand.as_literal().and_then(|lit| lit.type_name()) {
        Some(type_name) => Rule::TypeOf {
            property: property.to_owned(),
            type_name: type_name.to_owned(),
            positive,
            complement,
        },
        None => Rule::Equality {
            property: property.to_owned(),
            operand: operand.clone(),
            positive,
            complement,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Literal, Props};

    fn large() -> Operand {
        Operand::Literal(Literal::string("large"))
    }

    #[test]
    fn equality_and_inequality_share_a_rule() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare("size", CompareOp::Eq, large()));
        scheme.add_condition(Fact::compare("size", CompareOp::Neq, large()));
        let compiled = compile(scheme);
        assert_eq!(
            compiled.rules("size").unwrap(),
            [Rule::Equality {
                property: "size".into(),
                operand: large(),
                positive: "size≡´large´".into(),
                complement: "size≠´large´".into(),
            }]
        );
    }

    #[test]
    fn type_name_operand_compiles_to_type_of() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare(
            "v",
            CompareOp::Neq,
            Operand::Literal(Literal::parse("Function", false, 0).unwrap()),
        ));
        let compiled = compile(scheme);
        assert!(matches!(
            &compiled.rules("v").unwrap()[0],
            Rule::TypeOf { type_name, .. } if type_name == "function"
        ));
    }

    #[test]
    fn truthiness_compiles_to_truthy_and_falsy() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::truthy("disabled", true));
        scheme.add_condition(Fact::truthy("disabled", false));
        let compiled = compile(scheme);
        let rules = compiled.rules("disabled").unwrap();
        assert_eq!(rules.len(), 2);
        assert!(matches!(rules[0], Rule::Truthy { .. }));
        assert!(matches!(rules[1], Rule::Falsy { .. }));
    }

    #[test]
    fn property_operands_become_dependent_rules() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare(
            "min",
            CompareOp::Lte,
            Operand::Property {
                name: "value".into(),
                negated: false,
            },
        ));
        scheme.add_condition(Fact::compare(
            "min",
            CompareOp::Eq,
            Operand::Property {
                name: "fallback".into(),
                negated: false,
            },
        ));
        let compiled = compile(scheme);
        assert!(compiled.rules("min").is_none());
        let dependent = compiled.dependent_rules("min").unwrap();
        assert_eq!(dependent.properties, ["fallback", "min", "value"]);
        assert_eq!(dependent.rules.len(), 2);
    }

    #[test]
    fn base_block_holds_prepared_and_defaults() {
        let mut scheme = Scheme::new("s");
        scheme.add_prepared_condition("if-a∧b", "var(--a,var(--b))");
        scheme.add_condition(Fact::truthy("a", false));
        scheme.add_condition(Fact::truthy("b", false));
        scheme.add_condition(Fact::compare(
            "n",
            CompareOp::Gt,
            Operand::Literal(Literal::number(2.0)),
        ));
        let compiled = compile(scheme);
        assert_eq!(
            compiled.base().declarations,
            "--if-a∧b:var(--a,var(--b));\n--a: ;\n--b: ;\n--n⋗2: ;"
        );
        assert_eq!(compiled.base().key, compiled.base_key());
    }

    #[test]
    fn base_key_is_content_addressed() {
        let build = |name: &str| {
            let mut scheme = Scheme::new(name);
            scheme.add_condition(Fact::truthy("a", false));
            compile(scheme)
        };
        assert_eq!(build("one").base_key(), build("two").base_key());
    }

    #[test]
    fn compiled_rules_match_direct_evaluation() {
        let mut scheme = Scheme::new("s");
        scheme.add_condition(Fact::compare("size", CompareOp::Eq, large()));
        let mut compiled = compile(scheme);
        let out = compiled
            .serialize(&Props::new().set("size", "large"))
            .unwrap();
        assert_eq!(
            compiled.block(&out.matched).unwrap().declarations,
            "--size≡´large´:initial;\n--size≠´large´: ;"
        );
    }
}
