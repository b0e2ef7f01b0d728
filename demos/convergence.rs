// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! The example simulates two replicas editing the same text concurrently and then exchanging
//! their edits, arriving at the same result.

use logoot::{Document, Edit, Position};
use rand::{SeedableRng, rngs::StdRng};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Replica A starts the document. Every replica needs its own site id, since the site is
    // what keeps positions minted on different replicas apart.
    let mut replica_a = Document::with_content(1, "abc".chars());

    // Replica B joins with a copy of A's state.
    let mut replica_b = replica_a.fork(2, StdRng::from_os_rng());

    // --- Replica A: insert "d" before "c" ---
    // Local edits are expressed relative to an anchor position. The returned edit holds the
    // freshly minted position, which is all another replica needs to apply it.
    let c = replica_a.positions().nth(3).cloned().ok_or("no c")?;
    let from_a = replica_a.local_insert_left(&c, "d").ok_or("no room before c")?;

    // --- Replica B: delete "a", concurrently ---
    let b = replica_b.positions().nth(2).cloned().ok_or("no b")?;
    let from_b = replica_b.local_delete_left(&b).ok_or("nothing before b")?;

    println!("A is {:?} and sends {from_a:?}", replica_a.text());
    println!("B is {:?} and sends {from_b:?}", replica_b.text());

    // Edits travel between processes in whatever envelope the transport likes; positions have a
    // compact byte encoding for that.
    let wire = from_b.position().encode()?;
    let from_b = Edit::delete(Position::decode(&wire)?);

    // --- Sync ---
    replica_a.apply(from_b.clone());
    replica_b.apply(from_a.clone());

    // Redelivery is harmless.
    replica_a.apply(from_b);
    replica_b.apply(from_a);

    println!("A is {:?}, B is {:?}", replica_a.text(), replica_b.text());
    assert_eq!(replica_a, replica_b);
    assert_eq!(replica_a.text(), "bdc");

    Ok(())
}
