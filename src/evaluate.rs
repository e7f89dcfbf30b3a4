use crate::types::{Operand, Rule, SchemeOptions};
use crate::{Props, Value};

/// Accumulates `--name:value;` declarations for one block.
pub(crate) struct Declarations<'o> {
    options: &'o SchemeOptions,
    text: String,
}

impl<'o> Declarations<'o> {
    pub(crate) fn new(options: &'o SchemeOptions) -> Self {
        Self {
            options,
            text: String::new(),
        }
    }

    pub(crate) fn push_value(&mut self, name: &str, value: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str("--");
        self.text.push_str(name);
        self.text.push(':');
        self.text.push_str(value);
        self.text.push(';');
    }

    pub(crate) fn push_flag(&mut self, flag: &str, on: bool) {
        let options = self.options;
        let value = if on { &options.on } else { &options.off };
        self.push_value(flag, value);
    }

    pub(crate) fn finish(self) -> String {
        self.text
    }
}

fn resolve(operand: &Operand, props: &Props) -> Value {
    match operand {
        Operand::Literal(lit) => lit.to_value(),
        Operand::Property { name, negated } => {
            let value = props.get(name);
            if *negated {
                Value::Bool(!value.is_truthy())
            } else {
                value.clone()
            }
        }
    }
}

/// The state of every flag `rule` owns, given the property bag.
pub(crate) fn flag_states<'r>(rule: &'r Rule, props: &Props) -> Vec<(&'r str, bool)> {
    match rule {
        Rule::Truthy { property, flag } => vec![(flag.as_str(), props.get(property).is_truthy())],
        Rule::Falsy { property, flag } => vec![(flag.as_str(), !props.get(property).is_truthy())],
        Rule::Equality {
            property,
            operand,
            positive,
            complement,
        } => {
            let equal = props.get(property).loose_eq(&resolve(operand, props));
            vec![(positive.as_str(), equal), (complement.as_str(), !equal)]
        }
        Rule::TypeOf {
            property,
            type_name,
            positive,
            complement,
        } => {
            let equal = props.get(property).type_of() == type_name.as_str();
            vec![(positive.as_str(), equal), (complement.as_str(), !equal)]
        }
        Rule::Relational {
            property,
            op,
            operand,
            flag,
        } => vec![(
            flag.as_str(),
            props.get(property).compare(*op, &resolve(operand, props)),
        )],
    }
}

/// Emit the declarations `rules` produce for `props`. Sparse rules only
/// emit flags that are on.
pub(crate) fn apply(rules: &[Rule], props: &Props, out: &mut Declarations<'_>) {
    for rule in rules {
        for (flag, on) in flag_states(rule, props) {
            if on || !rule.is_sparse() {
                out.push_flag(flag, on);
            }
        }
    }
}

/// Emit the state of every flag when no property is set.
pub(crate) fn defaults(rules: &[Rule], out: &mut Declarations<'_>) {
    let empty = Props::new();
    for rule in rules {
        for (flag, on) in flag_states(rule, &empty) {
            out.push_flag(flag, on && !rule.is_sparse());
        }
    }
}
