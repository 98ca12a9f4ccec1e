fn main() {
    smarthome_lib::run()
}
