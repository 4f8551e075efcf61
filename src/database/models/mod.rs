pub mod goal;
pub mod task;
pub mod user;

pub use goal::{Goal, GoalDetail, GoalFields, Habit, NewHabit, Subgoal};
pub use task::{Task, TaskList, TaskListWithTasks};
pub use user::{NewUser, User};
