#![allow(dead_code)]

use recur_features::Transaction;

pub fn tx(id: i64, name: &str, amount: f64, date: &str) -> Transaction {
    Transaction::new(id, "user1", name, amount, date).unwrap()
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-4
}
