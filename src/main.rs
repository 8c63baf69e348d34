fn main() {
    indent_curves::cli::run();
}
