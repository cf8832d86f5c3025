use std::fmt;

use blockpool::{DynArray, FreeListAllocator};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Person {
    name: String,
    age: u32,
    salary: f64,
}

impl Person {
    fn new(name: &str, age: u32, salary: f64) -> Self {
        Self {
            name: name.to_owned(),
            age,
            salary,
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Person {{ name: {}, age: {}, salary: {} }}",
            self.name, self.age, self.salary
        )
    }
}

fn integers() {
    println!("== integers ==");
    let alloc = FreeListAllocator::new();
    let mut numbers = DynArray::new_in(&alloc);

    for i in 0..10 {
        numbers.push(i * 10);
        println!(
            "pushed {}, len {}, capacity {}",
            i * 10,
            numbers.len(),
            numbers.capacity()
        );
    }

    for (i, n) in numbers.iter().enumerate() {
        println!("numbers[{i}] = {n}");
    }
}

fn people() {
    println!("\n== people ==");
    let alloc = FreeListAllocator::new();
    let mut people = DynArray::new_in(&alloc);

    people.push(Person::new("Alice", 25, 50_000.0));
    people.push(Person::new("Bob", 30, 60_000.0));
    people.push(Person::new("Charlie", 35, 70_000.0));

    people[1].age = 31;
    people[1].salary = 65_000.0;

    for person in &people {
        println!("{person}");
    }
}

fn reuse() {
    println!("\n== block reuse ==");
    let alloc = FreeListAllocator::new();

    {
        let mut first = DynArray::new_in(&alloc);
        first.extend(0..5);
        println!("first array: {first:?}");
    }
    let before = alloc.stats();

    {
        let mut second = DynArray::new_in(&alloc);
        second.extend(10..15);
        println!("second array: {second:?}");
    }
    let after = alloc.stats();

    println!(
        "fresh allocations: {} -> {}, reuses: {} -> {}",
        before.fresh_allocations, after.fresh_allocations, before.reuses, after.reuses
    );

    let mut v = allocator_api2::vec::Vec::new_in(&alloc);
    v.push(42);
    println!("allocator_api2 Vec: {v:?}, {:?}", alloc.stats());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockpool=debug")),
        )
        .init();

    integers();
    people();
    reuse();
}
