#![no_main]

//! Fuzz target for context chains
//!
//! Builds random context trees, registers providers of every lifetime at
//! random levels and checks that resolution keeps its identity guarantees.

use arbitrary::Arbitrary;
use diy_ioc::{Context, Lifetime};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
struct Leaf(u32);

#[derive(Debug)]
struct Branch {
    leaf: Arc<Leaf>,
}

#[derive(Debug, Default)]
struct Fallback;

#[derive(Debug, Arbitrary)]
enum Op {
    Scope { from: u8 },
    DropContext { at: u8 },
    LeafValue { at: u8, leaf: Leaf },
    LeafSingleton { at: u8, id: u32 },
    BranchSingleton { at: u8 },
    BranchFactory { at: u8 },
    Resolve { at: u8 },
    ResolveDefault { at: u8 },
    Unregister { at: u8 },
    Clear { at: u8 },
}

fn pick(contexts: &[Context], at: u8) -> &Context {
    &contexts[at as usize % contexts.len()]
}

fuzz_target!(|ops: Vec<Op>| {
    let mut contexts = vec![Context::new()];

    for op in ops.into_iter().take(100) {
        match op {
            Op::Scope { from } => {
                if contexts.len() < 16 {
                    let child = pick(&contexts, from).scope();
                    contexts.push(child);
                }
            }
            Op::DropContext { at } => {
                if contexts.len() > 1 {
                    let index = 1 + at as usize % (contexts.len() - 1);
                    contexts.remove(index);
                }
            }
            Op::LeafValue { at, leaf } => {
                let leaf = Arc::new(leaf);
                let ctx = pick(&contexts, at);
                ctx.register_value(Arc::clone(&leaf));
                let resolved = ctx.resolve::<Leaf>().unwrap();
                assert!(Arc::ptr_eq(&resolved, &leaf));
            }
            Op::LeafSingleton { at, id } => {
                pick(&contexts, at).register_singleton(move || Leaf(id));
            }
            Op::BranchSingleton { at } => {
                pick(&contexts, at).register_singleton(|leaf: Arc<Leaf>| Branch { leaf });
            }
            Op::BranchFactory { at } => {
                pick(&contexts, at).register_factory(|leaf: Arc<Leaf>| Branch { leaf });
            }
            Op::Resolve { at } => {
                let ctx = pick(&contexts, at);
                match (ctx.resolve::<Branch>(), ctx.resolve::<Branch>()) {
                    (Ok(a), Ok(b)) => {
                        let singleton = ctx.lifetime_of::<Branch>() == Some(Lifetime::Singleton);
                        assert_eq!(Arc::ptr_eq(&a, &b), singleton);
                        assert!(ctx.resolve::<Leaf>().is_ok());
                    }
                    (Err(a), Err(b)) => assert_eq!(a.is_not_found(), b.is_not_found()),
                    _ => {}
                }
            }
            Op::ResolveDefault { at } => {
                let ctx = pick(&contexts, at);
                let a = ctx.resolve_or_default::<Fallback>().unwrap();
                let b = contexts[0].resolve::<Fallback>().unwrap();
                assert!(Arc::ptr_eq(&a, &b));
            }
            Op::Unregister { at } => {
                let ctx = pick(&contexts, at);
                let local = ctx.contains_local::<Leaf>();
                assert_eq!(ctx.unregister::<Leaf>(), local);
            }
            Op::Clear { at } => {
                let ctx = pick(&contexts, at);
                ctx.clear();
                assert!(ctx.is_empty());
            }
        }
    }
});
