#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use satnogs_rotator::config::VERSION;
use satnogs_rotator::Actuator;
use {defmt_rtt as _, panic_probe as _};

use satnogs_rotator_fw::{
    drivers::HardwareWatchdog,
    ipc::{ACTUATION, LINK},
    tasks::{protocol_task, sensor_task, supervisor_task},
    Board,
};

// USART2 is unused on this board; its vector drives the supervisor executor
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn USART2() {
    EXECUTOR_HIGH.on_interrupt()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting SatNOGS rotator controller {}", VERSION);
    let board = Board::init();

    let mut motor = board.motor_enable;
    motor.enable();
    ACTUATION.lock(|a| *a.borrow_mut() = Some(motor));
    LINK.lock(|l| *l.borrow_mut() = Some(board.link));

    // Supervisor preempts both thread-mode tasks
    interrupt::USART2.set_priority(Priority::P1);
    let spawner_high_priority = EXECUTOR_HIGH.start(interrupt::USART2);
    spawner_high_priority
        .spawn(supervisor_task(HardwareWatchdog::new(board.iwdg)))
        .unwrap();
    info!("Supervisor task spawned on interrupt executor");

    spawner
        .spawn(sensor_task(board.i2c2, board.end_stops, board.motor_faults))
        .unwrap();
    spawner.spawn(protocol_task()).unwrap();
    info!("Sensor and protocol tasks spawned on main executor");

    core::future::pending::<()>().await;
}
