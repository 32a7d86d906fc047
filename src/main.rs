fn main() {
    tablemerge_lib::run()
}
