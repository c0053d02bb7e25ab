//! Macro-generated conformance suite for `InvoiceDatabase` implementations.
//!
//! Every backend must produce the same outcomes for the same calls; the
//! suite is instantiated once per backend.
//!
//! # Generated tests
//!
//! ## Save
//! - `test_save_new_invoice`: insert is visible and count grows by one
//! - `test_save_existing_replaces`: replace keeps count and order
//! - `test_save_assigns_id`: empty id gets one past the largest numeric id
//! - `test_save_assigns_id_for_blank_id`: whitespace ids are assigned too
//! - `test_save_fails_when_ids_are_exhausted`: no wrap-around past `u64::MAX`
//!
//! ## Reads
//! - `test_find_by_id_missing`, `test_exists_by_id`, `test_find_all_*`
//! - `test_find_all_by_seller_name`, `test_find_all_by_buyer_name`
//! - `test_find_all_by_field_is_exact`
//!
//! ## Delete
//! - `test_delete_by_id`: removes one, keeps order of the rest
//! - `test_delete_by_id_missing`: fails with `InvoiceNotFound`
//! - `test_delete_all`
//!
//! ## Concurrency
//! - `test_concurrent_saves`: parallel writers lose no update

/// Generate the conformance suite.
///
/// `$factory` must evaluate to a `(guard, store)` pair; the guard keeps any
/// scratch resources alive for the duration of one test. It is re-evaluated
/// for every test.
macro_rules! invoice_database_tests {
    ($factory:expr) => {
        mod invoice_database_contract_tests {
            use super::*;
            use invoicedb::{InvoiceDatabase, InvoiceField, StorageError};

            // ==================================================================
            // Save
            // ==================================================================

            #[test]
            fn test_save_new_invoice() {
                let (_guard, db) = $factory;
                db.save(invoice_with_id("1")).unwrap();
                let invoice = invoice_with_id("2");

                let saved = db.save(invoice.clone()).unwrap();

                assert_eq!(saved, invoice);
                assert_eq!(db.find_by_id("2").unwrap(), Some(invoice));
                assert_eq!(db.count().unwrap(), 2);
            }

            #[test]
            fn test_save_existing_replaces() {
                let (_guard, db) = $factory;
                for id in ["1", "2", "3"] {
                    db.save(invoice_with_id(id)).unwrap();
                }
                let updated = invoice_with_id("2");

                db.save(updated.clone()).unwrap();

                assert_eq!(db.find_by_id("2").unwrap(), Some(updated));
                assert_eq!(db.count().unwrap(), 3);
                assert_eq!(ids(&db.find_all().unwrap()), vec!["1", "2", "3"]);
            }

            #[test]
            fn test_save_assigns_id() {
                let (_guard, db) = $factory;
                db.save(invoice_with_id("4")).unwrap();
                db.save(invoice_with_id("ABC")).unwrap();

                let saved = db.save(invoice_with_id("")).unwrap();

                assert_eq!(saved.id, "5");
                assert_eq!(db.find_by_id("5").unwrap(), Some(saved));
            }

            #[test]
            fn test_save_assigns_first_id() {
                let (_guard, db) = $factory;

                let saved = db.save(invoice_with_id("")).unwrap();

                assert_eq!(saved.id, "1");
            }

            #[test]
            fn test_save_assigns_id_for_blank_id() {
                let (_guard, db) = $factory;
                db.save(invoice_with_id("2")).unwrap();

                let saved = db.save(invoice_with_id("  ")).unwrap();

                assert_eq!(saved.id, "3");
                assert_eq!(db.find_by_id("3").unwrap(), Some(saved));
                assert!(db.find_by_id("  ").unwrap().is_none());
                assert_eq!(db.count().unwrap(), 2);
            }

            #[test]
            fn test_save_fails_when_ids_are_exhausted() {
                let (_guard, db) = $factory;
                db.save(invoice_with_id("18446744073709551615")).unwrap();

                let result = db.save(invoice_with_id(""));

                assert!(matches!(result, Err(StorageError::IdOverflow(u64::MAX))));
                assert_eq!(db.count().unwrap(), 1);
            }

            // ==================================================================
            // Reads
            // ==================================================================

            #[test]
            fn test_find_by_id_missing() {
                let (_guard, db) = $factory;
                assert!(db.find_by_id("-1").unwrap().is_none());

                db.save(invoice_with_id("1")).unwrap();
                assert!(db.find_by_id("-1").unwrap().is_none());
            }

            #[test]
            fn test_exists_by_id() {
                let (_guard, db) = $factory;
                assert!(!db.exists_by_id("1").unwrap());

                db.save(invoice_with_id("1")).unwrap();

                assert!(db.exists_by_id("1").unwrap());
                assert!(!db.exists_by_id("2").unwrap());
            }

            #[test]
            fn test_find_all_empty() {
                let (_guard, db) = $factory;

                assert!(db.find_all().unwrap().is_empty());
                assert_eq!(db.count().unwrap(), 0);
            }

            #[test]
            fn test_find_all_in_order() {
                let (_guard, db) = $factory;
                let invoices: Vec<_> = ["7", "3", "5"].into_iter().map(invoice_with_id).collect();
                for invoice in &invoices {
                    db.save(invoice.clone()).unwrap();
                }

                assert_eq!(db.find_all().unwrap(), invoices);
            }

            #[test]
            fn test_find_all_by_seller_name() {
                let (_guard, db) = $factory;
                db.save(invoice_with_seller("1", "Acme")).unwrap();
                db.save(invoice_with_seller("2", "Acme")).unwrap();
                db.save(invoice_with_seller("3", "Other")).unwrap();

                let found = db.find_all_by_seller_name("Acme").unwrap();

                assert_eq!(ids(&found), vec!["1", "2"]);
                assert_eq!(db.count().unwrap(), 3);
                assert!(db.find_all_by_seller_name("Nobody").unwrap().is_empty());
            }

            #[test]
            fn test_find_all_by_buyer_name() {
                let (_guard, db) = $factory;
                db.save(invoice_with_buyer("1", "Logitech")).unwrap();
                db.save(invoice_with_buyer("2", "Samsung")).unwrap();
                db.save(invoice_with_buyer("3", "Logitech")).unwrap();

                let found = db.find_all_by_buyer_name("Logitech").unwrap();

                assert_eq!(ids(&found), vec!["1", "3"]);
                assert!(db.find_all_by_buyer_name("Hitachi").unwrap().is_empty());
            }

            #[test]
            fn test_find_all_by_field_is_exact() {
                let (_guard, db) = $factory;
                db.save(invoice_with("1", "Acme", "Globex")).unwrap();
                db.save(invoice_with("2", "acme", "Acme")).unwrap();
                db.save(invoice_with("3", "Acme Corp", "Globex")).unwrap();

                let sellers = db.find_all_by_field(InvoiceField::SellerName, "Acme").unwrap();
                let buyers = db.find_all_by_field(InvoiceField::BuyerName, "Acme").unwrap();

                assert_eq!(ids(&sellers), vec!["1"]);
                assert_eq!(ids(&buyers), vec!["2"]);
            }

            #[test]
            fn test_search_sees_replacement() {
                let (_guard, db) = $factory;
                db.save(invoice_with_seller("1", "Acme")).unwrap();
                db.save(invoice_with_seller("2", "Acme")).unwrap();

                db.save(invoice_with_seller("1", "Initech")).unwrap();

                assert_eq!(ids(&db.find_all_by_seller_name("Acme").unwrap()), vec!["2"]);
                assert_eq!(ids(&db.find_all_by_seller_name("Initech").unwrap()), vec!["1"]);
            }

            // ==================================================================
            // Delete
            // ==================================================================

            #[test]
            fn test_delete_by_id() {
                let (_guard, db) = $factory;
                for id in ["1", "2", "3"] {
                    db.save(invoice_with_id(id)).unwrap();
                }

                db.delete_by_id("2").unwrap();

                assert!(!db.exists_by_id("2").unwrap());
                assert_eq!(ids(&db.find_all().unwrap()), vec!["1", "3"]);
                assert_eq!(db.count().unwrap(), 2);
            }

            #[test]
            fn test_delete_by_id_missing() {
                let (_guard, db) = $factory;
                db.save(invoice_with_id("10")).unwrap();

                let result = db.delete_by_id("-1");

                assert!(
                    matches!(result, Err(StorageError::InvoiceNotFound(ref id)) if id == "-1"),
                    "deleting an absent id must fail, got {:?}",
                    result
                );
                assert_eq!(db.count().unwrap(), 1);
            }

            #[test]
            fn test_delete_by_id_on_empty_store() {
                let (_guard, db) = $factory;

                let result = db.delete_by_id("1");

                assert!(result.unwrap_err().is_not_found());
            }

            #[test]
            fn test_delete_all() {
                let (_guard, db) = $factory;
                db.delete_all().unwrap();
                for id in ["1", "2", "3"] {
                    db.save(invoice_with_id(id)).unwrap();
                }

                db.delete_all().unwrap();

                assert_eq!(db.count().unwrap(), 0);
                assert!(db.find_all().unwrap().is_empty());
                assert!(!db.exists_by_id("1").unwrap());
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[test]
            fn test_concurrent_saves() {
                let (_guard, db) = $factory;
                let db = &db;

                std::thread::scope(|scope| {
                    for thread in 0..4 {
                        scope.spawn(move || {
                            for n in 0..10 {
                                let id = format!("{}", thread * 100 + n);
                                db.save(invoice_with_id(&id)).unwrap();
                            }
                        });
                    }
                });

                assert_eq!(db.count().unwrap(), 40);
                assert!(db.exists_by_id("309").unwrap());
            }
        }
    };
}
