pub mod terminate;
