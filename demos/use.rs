use balanced_map::{AvlTreeMap, Error, OrderedMap, RbTreeMap};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn fill<M: OrderedMap<i32, &'static str>>(map: &mut M) -> Result<(), Error> {
    map.insert(0, "zero")?;
    map.insert(1, "one")?;
    map.insert(2, "two")?;
    map.insert(3, "three")?;
    map.insert(4, "four")?;
    map.insert(5, "five")?;
    Ok(())
}

fn show<M: OrderedMap<i32, &'static str>>(name: &str, map: &mut M) {
    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(map.insert(2, "two"), Err(Error::DuplicateKey));
    map.remove(&1);
    assert!(map.get(&1).is_none());

    println!("{name}:");
    for (k, v) in map.iter() {
        println!("  {k} => {v}");
    }
}

fn main() -> Result<(), Error> {
    TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("logger is installed once");

    let mut avl = AvlTreeMap::new();
    fill(&mut avl)?;
    show("AVL tree", &mut avl);

    let mut rb = RbTreeMap::new();
    fill(&mut rb)?;
    show("red-black tree", &mut rb);

    avl.clear();
    rb.clear();
    Ok(())
}
