use std::sync::{Arc, Mutex};
use std::thread;

use condstyle::{parse, CompiledScheme, Props, Scheme};

fn compiled() -> CompiledScheme {
    let mut scheme = Scheme::new("button");
    parse(
        "color: if(size == 'large', red, blue); opacity: if(!disabled, 1, 0.5);",
        &mut scheme,
    )
    .unwrap();
    scheme.prepare_styles()
}

#[test]
fn serialize_across_threads() {
    let scheme = Arc::new(Mutex::new(compiled()));

    let mut handles = vec![];
    for i in 0..8 {
        let scheme = Arc::clone(&scheme);
        handles.push(thread::spawn(move || {
            let size = if i % 2 == 0 { "large" } else { "small" };
            let props = Props::new().set("size", size).set("disabled", i % 4 == 0);
            scheme.lock().unwrap().serialize(&props).unwrap()
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    // Threads with the same inputs see the same keys.
    assert_eq!(results[0], results[4]);
    assert_eq!(results[1], results[5]);
    assert_ne!(results[0], results[1]);

    // Base block, two sizes, two disabled states.
    let scheme = scheme.lock().unwrap();
    assert_eq!(scheme.blocks().len(), 5);
}

#[test]
fn blocks_are_generated_once_under_contention() {
    let scheme = Arc::new(Mutex::new(compiled()));
    let props = Props::new().set("size", "large");

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let scheme = Arc::clone(&scheme);
            let props = props.clone();
            thread::spawn(move || scheme.lock().unwrap().serialize(&props).unwrap())
        })
        .collect();
    let keys: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().matched)
        .collect();

    assert!(keys.windows(2).all(|w| w[0] == w[1]));
    let mut scheme = scheme.lock().unwrap();
    assert_eq!(scheme.flush().len(), 2);
}

#[test]
fn schemes_compile_independently_on_threads() {
    let handles: Vec<_> = ["alpha", "beta", "gamma"]
        .into_iter()
        .map(|name| {
            thread::spawn(move || {
                let mut scheme = Scheme::new(name);
                let css = parse("if(a && b, x, y)", &mut scheme).unwrap();
                (css, scheme.prepare_styles().base_key().to_owned())
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
