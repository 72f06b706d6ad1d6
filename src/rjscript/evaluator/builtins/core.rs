use std::rc::Rc;

use tracing::info;

use crate::rjscript::{
    evaluator::runtime::value::{Location, RJSValue},
    functions::{
        function::{Function, NativeFn, NativeFunction},
        signature::{Parameter, Signature},
    },
    semantics::{
        builtins::{Builtin, BUILTINS_TBL},
        types::{Cardinality::*, VarType},
    },
};

fn builtin_impl(b: Builtin) -> NativeFn {
    match b {
        Builtin::Sum => builtin_sum,
        Builtin::Join => builtin_join,
        Builtin::Location => builtin_location,
        Builtin::Shift => builtin_shift,
        Builtin::Round => builtin_round,
        Builtin::Print => builtin_print,
    }
}

fn builtin_signature(b: Builtin, name: &str) -> Signature {
    let zero = || vec![RJSValue::Number(0.0)];
    match b {
        Builtin::Sum => Signature::new(name, vec![Parameter::new("numbers", VarType::Number, Multiple)])
            .returning(VarType::Number, Single),
        Builtin::Join => Signature::new(name, vec![Parameter::new("texts", VarType::String, Multiple)])
            .returning(VarType::String, Single),
        Builtin::Location => Signature::new(
            name,
            vec![
                Parameter::new("x", VarType::Number, Single),
                Parameter::new("y", VarType::Number, Single),
                Parameter::new("z", VarType::Number, Single).with_default(zero()),
            ],
        )
        .returning(VarType::Location, Single),
        Builtin::Shift => Signature::new(
            name,
            vec![
                Parameter::new("loc", VarType::Location, Single),
                Parameter::new("dx", VarType::Number, Single),
                Parameter::new("dy", VarType::Number, Single).with_default(zero()),
                Parameter::new("dz", VarType::Number, Single).with_default(zero()),
            ],
        )
        .returning(VarType::Location, Single),
        Builtin::Round => Signature::new(name, vec![Parameter::new("n", VarType::Number, Single)])
            .returning(VarType::Number, Single),
        Builtin::Print => Signature::new(name, vec![Parameter::new("values", VarType::Any, Multiple)]),
    }
}

/// Fresh native function objects for every builtin.
pub fn builtins_table() -> Vec<Rc<dyn Function>> {
    BUILTINS_TBL
        .iter()
        .map(|(b, name)| {
            let f: Rc<dyn Function> =
                Rc::new(NativeFunction::new(builtin_signature(*b, name), builtin_impl(*b)));
            f
        })
        .collect()
}

fn number_at(params: &[Vec<RJSValue>], index: usize) -> Option<f64> {
    params.get(index)?.first()?.as_number()
}

fn builtin_sum(params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
    let total = params
        .first()?
        .iter()
        .filter_map(RJSValue::as_number)
        .sum::<f64>();
    Some(vec![RJSValue::Number(total)])
}

fn builtin_join(params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
    let out = params
        .first()?
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    Some(vec![RJSValue::String(out)])
}

fn builtin_location(params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
    let loc = Location::new(
        number_at(params, 0)?,
        number_at(params, 1)?,
        number_at(params, 2)?,
    );
    Some(vec![RJSValue::location(loc)])
}

/// Moves the location it was given and returns it.
fn builtin_shift(params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
    let target = params.first()?.first()?.clone();
    let RJSValue::Location(loc) = &target else {
        return None;
    };
    loc.borrow_mut().shift(
        number_at(params, 1)?,
        number_at(params, 2)?,
        number_at(params, 3)?,
    );
    Some(vec![target])
}

fn builtin_round(params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
    number_at(params, 0).map(|n| vec![RJSValue::Number(n.round())])
}

fn builtin_print(params: &[Vec<RJSValue>]) -> Option<Vec<RJSValue>> {
    let out = params
        .iter()
        .flatten()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("");
    info!(target: "rjsbind::script", "{}", out);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(name: &str) -> Rc<dyn Function> {
        builtins_table()
            .into_iter()
            .find(|f| f.signature().name() == name)
            .expect("builtin exists")
    }

    fn nums(values: &[f64]) -> Vec<RJSValue> {
        values.iter().map(|n| RJSValue::Number(*n)).collect()
    }

    #[test]
    fn sum_adds_everything_in_its_one_slot() {
        let out = find("sum").execute(vec![nums(&[1.0, 2.0, 3.5])]);
        assert_eq!(out, Some(nums(&[6.5])));
    }

    #[test]
    fn location_defaults_z() {
        let out = find("location").execute(vec![nums(&[1.0]), nums(&[2.0])]);
        assert_eq!(out, Some(vec![RJSValue::location(Location::new(1.0, 2.0, 0.0))]));
    }

    #[test]
    fn shift_moves_its_argument() {
        let loc = RJSValue::location(Location::new(0.0, 0.0, 0.0));
        let out = find("shift").execute(vec![vec![loc.clone()], nums(&[5.0])]);
        assert_eq!(out, Some(vec![RJSValue::location(Location::new(5.0, 0.0, 0.0))]));
        // the slot was shared with `loc`, nothing copied at this level
        assert_eq!(loc, RJSValue::location(Location::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn print_returns_nothing() {
        assert_eq!(find("print").execute(vec![nums(&[1.0])]), None);
        assert_eq!(find("print").signature().return_type(), None);
    }
}
