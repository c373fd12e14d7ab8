//! First-use registration under concurrent callers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use dot_system::{Ptr, Reflected, ReflectionResult, Type, TypeBuilder, TypeRegistry};

static BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Contended {
    hits: i32,
}

impl Reflected for Contended {
    fn build_type() -> ReflectionResult<Type> {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which other threads arrive mid-build.
        thread::sleep(std::time::Duration::from_millis(20));
        TypeBuilder::<Contended>::new("Dot.Test.Concurrency", "Contended")
            .is_class()
            .with_field("hits", |c: &Contended| &c.hits, |c: &mut Contended| &mut c.hits)
            .with_constructor(|| Ptr::new(Contended::default()), &[])
            .build()
    }
}

#[test]
fn test_concurrent_first_access_builds_once() {
    const THREADS: usize = 16;
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                Contended::type_of()
            })
        })
        .collect();
    let types: Vec<Type> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    for ty in &types {
        assert!(Type::ptr_eq(ty, &types[0]));
        assert!(ty.is_sealed());
        assert_eq!(ty.get_fields().len(), 1);
        assert_eq!(ty.get_constructors().len(), 1);
    }

    Contended::type_of();
    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_lookups_after_registration() {
    let ty = i64::type_of();
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| TypeRegistry::global().get("System.Int64")))
        .collect();
    for handle in handles {
        let found = handle.join().unwrap().unwrap();
        assert!(Type::ptr_eq(&found, &ty));
    }
}

struct Tree {
    leaf: Ptr<Leaf>,
}

struct Leaf;

impl Reflected for Tree {
    fn build_type() -> ReflectionResult<Type> {
        thread::sleep(Duration::from_millis(20));
        TypeBuilder::<Tree>::new("Dot.Test.Concurrency", "Tree")
            .is_class()
            .with_method("leaf", |t: &Tree| t.leaf.clone(), &[])
            .with_constructor(|| Ptr::new(Tree { leaf: Ptr::new(Leaf) }), &[])
            .build()
    }
}

impl Reflected for Leaf {
    fn build_type() -> ReflectionResult<Type> {
        thread::sleep(Duration::from_millis(20));
        TypeBuilder::<Leaf>::new("Dot.Test.Concurrency", "Leaf")
            .is_class()
            .with_static_method("grow", || Ptr::new(Tree { leaf: Ptr::new(Leaf) }), &[])
            .build()
    }
}

#[test]
fn test_mutually_referencing_types_from_two_threads() {
    let barrier = Arc::new(Barrier::new(2));
    let (sender, receiver) = mpsc::channel();

    let spawn = |first: fn() -> ReflectionResult<Type>| {
        let barrier = Arc::clone(&barrier);
        let sender = sender.clone();
        thread::spawn(move || {
            barrier.wait();
            let _ = sender.send(first());
        })
    };
    spawn(Tree::try_type_of);
    spawn(Leaf::try_type_of);

    for _ in 0..2 {
        let built = receiver
            .recv_timeout(Duration::from_secs(10))
            .expect("registration did not finish");
        assert!(built.unwrap().is_sealed());
    }

    let tree = Tree::type_of();
    let leaf = Leaf::type_of();
    assert!(Type::ptr_eq(tree.get_method("leaf").unwrap().return_type(), &leaf));
    assert!(Type::ptr_eq(leaf.get_method("grow").unwrap().return_type(), &tree));
}
