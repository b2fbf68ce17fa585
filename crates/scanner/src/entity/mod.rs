pub mod delegated_data;
