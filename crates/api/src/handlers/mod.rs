pub mod drawings;
