//! Demo sqlite database with `departments`, `employees` and `sales`.

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;

use crate::error::DriverError;

const SCHEMA: [&str; 6] = [
    "DROP TABLE IF EXISTS sales",
    "DROP TABLE IF EXISTS employees",
    "DROP TABLE IF EXISTS departments",
    "CREATE TABLE departments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        location TEXT,
        budget REAL
    )",
    "CREATE TABLE employees (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT UNIQUE,
        department_id INTEGER,
        salary REAL,
        hire_date DATE,
        FOREIGN KEY (department_id) REFERENCES departments (id)
    )",
    "CREATE TABLE sales (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        employee_id INTEGER,
        product_name TEXT,
        quantity INTEGER,
        unit_price REAL,
        sale_date DATE,
        FOREIGN KEY (employee_id) REFERENCES employees (id)
    )",
];

const DEPARTMENTS: [(&str, &str, f64); 4] = [
    ("Engineering", "San Francisco", 500_000.0),
    ("Sales", "New York", 300_000.0),
    ("Marketing", "Chicago", 200_000.0),
    ("HR", "Boston", 150_000.0),
];

const EMPLOYEES: [(&str, &str, &str, i64, f64, &str); 6] = [
    ("John", "Doe", "john.doe@company.com", 1, 75_000.0, "2020-01-15"),
    ("Jane", "Smith", "jane.smith@company.com", 1, 80_000.0, "2019-03-20"),
    ("Mike", "Johnson", "mike.johnson@company.com", 2, 65_000.0, "2021-06-10"),
    ("Sarah", "Wilson", "sarah.wilson@company.com", 2, 70_000.0, "2020-11-05"),
    ("David", "Brown", "david.brown@company.com", 3, 60_000.0, "2022-02-14"),
    ("Lisa", "Davis", "lisa.davis@company.com", 4, 55_000.0, "2021-09-08"),
];

const SALES: [(i64, &str, i64, f64, &str); 7] = [
    (1, "Software License", 5, 1_000.0, "2023-01-15"),
    (1, "Consulting", 10, 150.0, "2023-01-20"),
    (3, "Product A", 20, 50.0, "2023-02-01"),
    (3, "Product B", 15, 75.0, "2023-02-10"),
    (4, "Service Contract", 1, 5_000.0, "2023-02-15"),
    (2, "Software License", 3, 1_000.0, "2023-03-01"),
    (5, "Marketing Campaign", 1, 10_000.0, "2023-03-05"),
];

/// (Re)creates the demo tables at `path`, creating the file and its parent
/// directory when missing. Existing demo tables are dropped first.
pub async fn create_sample_database(path: &Path) -> Result<(), DriverError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(sqlx::Error::Io)?;
    }

    let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let mut conn = SqliteConnection::connect_with(&options).await?;
    let mut tx = conn.begin().await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    for (name, location, budget) in DEPARTMENTS {
        sqlx::query("INSERT INTO departments (name, location, budget) VALUES (?, ?, ?)")
            .bind(name)
            .bind(location)
            .bind(budget)
            .execute(&mut *tx)
            .await?;
    }
    for (first, last, email, department, salary, hired) in EMPLOYEES {
        sqlx::query(
            "INSERT INTO employees (first_name, last_name, email, department_id, salary, hire_date) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(department)
        .bind(salary)
        .bind(hired)
        .execute(&mut *tx)
        .await?;
    }
    for (employee, product, quantity, price, sold) in SALES {
        sqlx::query(
            "INSERT INTO sales (employee_id, product_name, quantity, unit_price, sale_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(employee)
        .bind(product)
        .bind(quantity)
        .bind(price)
        .bind(sold)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    conn.close().await?;
    tracing::info!(path = %path.display(), "sample database created");
    Ok(())
}
